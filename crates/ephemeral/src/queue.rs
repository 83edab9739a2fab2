// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Queue Manager: four priority FIFO queues.

use crawl_core::{JobId, JobKind, Priority};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// One entry in a priority queue.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub job_id: JobId,
    pub priority: Priority,
    pub enqueued_at: DateTime<Utc>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub job_kind: JobKind,
    pub retry_count: u32,
}

/// Per-priority lengths plus cumulative counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub urgent_len: usize,
    pub high_len: usize,
    pub normal_len: usize,
    pub low_len: usize,
    pub total_enqueued: u64,
    pub total_dequeued: u64,
}

impl QueueStats {
    pub fn total_len(&self) -> usize {
        self.urgent_len + self.high_len + self.normal_len + self.low_len
    }
}

struct Queues {
    by_priority: HashMap<Priority, VecDeque<QueueEntry>>,
    total_enqueued: u64,
    total_dequeued: u64,
}

impl Default for Queues {
    fn default() -> Self {
        let mut by_priority = HashMap::new();
        for p in Priority::ALL {
            by_priority.insert(p, VecDeque::new());
        }
        Self { by_priority, total_enqueued: 0, total_dequeued: 0 }
    }
}

/// Holds four FIFO queues in priority order.
///
/// Multi-step operations here use read-modify-write rather than
/// compare-and-swap; a single mutex guards the whole structure rather than
/// per-priority locks, since every queue op touches at most one priority's
/// deque plus the shared counters. This map is advisory — the State Store
/// remains the source of truth.
pub struct QueueManager {
    queues: Mutex<Queues>,
}

impl Default for QueueManager {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueManager {
    pub fn new() -> Self {
        Self { queues: Mutex::new(Queues::default()) }
    }

    /// Append to the tail of `priority`'s queue.
    pub fn enqueue(&self, entry: QueueEntry) {
        let mut queues = self.queues.lock();
        let priority = entry.priority;
        queues.by_priority.entry(priority).or_default().push_back(entry);
        queues.total_enqueued += 1;
    }

    /// Poll priorities in rank order (or a single `priority` if given).
    /// An entry whose `scheduled_for` is still in the future is rotated to
    /// the tail rather than returned, preserving delayed scheduling without
    /// blocking other work, at the cost of rotating delayed items.
    pub fn dequeue(&self, priority: Option<Priority>, now: DateTime<Utc>) -> Option<QueueEntry> {
        let mut queues = self.queues.lock();
        let candidates: &[Priority] = match &priority {
            Some(p) => std::slice::from_ref(p),
            None => &Priority::ALL,
        };
        for &p in candidates {
            let deque = queues.by_priority.entry(p).or_default();
            let len = deque.len();
            for _ in 0..len {
                let entry = deque.pop_front()?;
                if entry.scheduled_for.is_some_and(|t| t > now) {
                    deque.push_back(entry);
                    continue;
                }
                queues.total_dequeued += 1;
                return Some(entry);
            }
        }
        None
    }

    /// Remove a job from whichever queue holds it. Idempotent if already
    /// dequeued.
    pub fn remove(&self, job_id: JobId) -> bool {
        let mut queues = self.queues.lock();
        for deque in queues.by_priority.values_mut() {
            if let Some(pos) = deque.iter().position(|e| e.job_id == job_id) {
                deque.remove(pos);
                return true;
            }
        }
        false
    }

    /// 1-based position within `priority`'s queue, or `-1` if absent.
    pub fn position(&self, job_id: JobId, priority: Priority) -> i64 {
        let queues = self.queues.lock();
        let Some(deque) = queues.by_priority.get(&priority) else {
            return -1;
        };
        match deque.iter().position(|e| e.job_id == job_id) {
            Some(idx) => (idx + 1) as i64,
            None => -1,
        }
    }

    pub fn stats(&self) -> QueueStats {
        let queues = self.queues.lock();
        QueueStats {
            urgent_len: queues.by_priority.get(&Priority::Urgent).map_or(0, VecDeque::len),
            high_len: queues.by_priority.get(&Priority::High).map_or(0, VecDeque::len),
            normal_len: queues.by_priority.get(&Priority::Normal).map_or(0, VecDeque::len),
            low_len: queues.by_priority.get(&Priority::Low).map_or(0, VecDeque::len),
            total_enqueued: queues.total_enqueued,
            total_dequeued: queues.total_dequeued,
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;

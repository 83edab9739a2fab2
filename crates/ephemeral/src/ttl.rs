// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Short-TTL key-value and capped-list mirrors.
//!
//! Expiry is checked lazily on read/write rather than by a background
//! sweep: multi-step operations use read-modify-write with expiry refresh,
//! not compare-and-swap. This is acceptable because the map is advisory —
//! the State Store remains the source of truth.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// A map where each key carries its own expiry, refreshed on every write.
pub struct TtlMap<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlMap<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: Mutex::new(HashMap::new()) }
    }

    /// Insert or overwrite, resetting the TTL.
    pub fn set(&self, key: K, value: V) {
        let mut entries = self.entries.lock();
        entries.insert(key, Entry { value, expires_at: Instant::now() + self.ttl });
    }

    /// `None` if absent or expired. An expired entry is evicted on read.
    /// Absence here must never be read as job nonexistence — the State
    /// Store remains authoritative regardless of what this mirror holds.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn remove(&self, key: &K) {
        self.entries.lock().remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A per-key list capped at `max_len`, with its own TTL refreshed on every push.
pub struct TtlCappedList<K, V> {
    ttl: Duration,
    max_len: usize,
    entries: Mutex<HashMap<K, Entry<Vec<V>>>>,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCappedList<K, V> {
    pub fn new(ttl: Duration, max_len: usize) -> Self {
        Self { ttl, max_len, entries: Mutex::new(HashMap::new()) }
    }

    /// Prepend (most-recent-first), dropping anything past `max_len`.
    pub fn push_front(&self, key: K, value: V) {
        let mut entries = self.entries.lock();
        let entry = entries.entry(key).or_insert_with(|| Entry { value: Vec::new(), expires_at: Instant::now() });
        entry.value.insert(0, value);
        entry.value.truncate(self.max_len);
        entry.expires_at = Instant::now() + self.ttl;
    }

    pub fn get(&self, key: &K) -> Vec<V> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => entry.value.clone(),
            Some(_) => {
                entries.remove(key);
                Vec::new()
            }
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
#[path = "ttl_tests.rs"]
mod tests;

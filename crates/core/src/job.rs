// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier, state machine, and progress tracking.

use crate::error::JobError;
use crate::ids::{JobId, KeywordId, ScheduleId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Priority of a queued job. Ordered exactly as declared: `Urgent` sorts
/// before `Low` so iterating `Priority::ALL` visits queues in dequeue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Urgent,
    High,
    Normal,
    Low,
}

impl Priority {
    /// All priorities, in dequeue rank order.
    pub const ALL: [Priority; 4] = [Priority::Urgent, Priority::High, Priority::Normal, Priority::Low];
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

crate::simple_display! {
    Priority {
        Urgent => "urgent",
        High => "high",
        Normal => "normal",
        Low => "low",
    }
}

/// Status of a job's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
    Retrying,
}

crate::simple_display! {
    JobStatus {
        Pending => "pending",
        Queued => "queued",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
        Retrying => "retrying",
    }
}

impl JobStatus {
    /// Terminal states cannot transition further.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }

    /// Whether cancellation is reachable from this status.
    pub fn can_cancel(self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Queued | JobStatus::Running | JobStatus::Retrying)
    }
}

/// The tagged job-kind variant: a typed enum the `CrawlExecutor` pattern-matches
/// over, rather than a `job_type` string branched on inside the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "job_type", rename_all = "snake_case")]
pub enum JobKind {
    KeywordCrawl { keyword_id: KeywordId, limit: u32 },
    TrendingCrawl { subreddit: Option<String>, limit: u32 },
    AllKeywordsCrawl { limit: u32 },
    CommentsCrawl { post_id: String, limit: u32 },
}

impl JobKind {
    /// The wire/display name of this kind, e.g. `"keyword_crawl"`.
    pub fn type_name(&self) -> &'static str {
        match self {
            JobKind::KeywordCrawl { .. } => "keyword_crawl",
            JobKind::TrendingCrawl { .. } => "trending_crawl",
            JobKind::AllKeywordsCrawl { .. } => "all_keywords_crawl",
            JobKind::CommentsCrawl { .. } => "comments_crawl",
        }
    }
}

/// Progress counters for a running or completed job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub current: u64,
    pub total: u64,
    pub message: Option<String>,
    pub items_processed: u64,
    pub items_saved: u64,
    pub items_failed: u64,
}

impl Progress {
    /// `100 * current / total` when `total > 0`, else 0; clamps to 100 when
    /// `current > total` rather than dividing by zero or overshooting.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let pct = 100.0 * self.current as f64 / self.total as f64;
        pct.min(100.0)
    }

    /// `saved / processed`, expressed as a percentage; 0 when nothing has
    /// been processed yet.
    pub fn success_rate(&self) -> f64 {
        if self.items_processed == 0 {
            return 0.0;
        }
        100.0 * self.items_saved as f64 / self.items_processed as f64
    }
}

/// A single crawl job instance and its full lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub user_id: UserId,
    pub keyword_id: Option<KeywordId>,
    pub schedule_id: Option<ScheduleId>,

    pub name: String,
    pub kind: JobKind,
    pub parameters: HashMap<String, String>,
    pub priority: Priority,
    pub max_retries: u32,
    /// Deadline the Worker Dispatcher enforces on a running attempt.
    pub timeout_seconds: u32,

    pub status: JobStatus,
    pub retry_count: u32,
    pub error_message: Option<String>,

    pub progress: Progress,

    pub created_at: DateTime<Utc>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub actual_duration_seconds: Option<i64>,

    pub points_consumed: u64,

    /// Updated at version, used by the State Store's optimistic concurrency
    /// check on every write.
    pub version: u64,
}

/// Everything needed to create a new job.
#[derive(Debug, Clone)]
pub struct JobDescriptor {
    pub user_id: UserId,
    pub keyword_id: Option<KeywordId>,
    pub schedule_id: Option<ScheduleId>,
    pub name: String,
    pub kind: JobKind,
    pub parameters: HashMap<String, String>,
    pub priority: Priority,
    pub max_retries: u32,
    pub timeout_seconds: u32,
    pub scheduled_for: Option<DateTime<Utc>>,
}

/// Default deadline for a running attempt when a descriptor doesn't specify
/// one.
pub const DEFAULT_TIMEOUT_SECONDS: u32 = 3600;

impl Job {
    /// Create a new job in `Pending` status.
    pub fn new(id: JobId, descriptor: JobDescriptor, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: descriptor.user_id,
            keyword_id: descriptor.keyword_id,
            schedule_id: descriptor.schedule_id,
            name: descriptor.name,
            kind: descriptor.kind,
            parameters: descriptor.parameters,
            priority: descriptor.priority,
            max_retries: descriptor.max_retries,
            timeout_seconds: descriptor.timeout_seconds,
            status: JobStatus::Pending,
            retry_count: 0,
            error_message: None,
            progress: Progress::default(),
            created_at: now,
            scheduled_for: descriptor.scheduled_for,
            started_at: None,
            completed_at: None,
            actual_duration_seconds: None,
            points_consumed: 0,
            version: 0,
        }
    }

    fn reject_if_terminal(&self) -> Result<(), JobError> {
        if self.status.is_terminal() {
            return Err(JobError::InvalidTransition(format!(
                "job {} is already terminal ({})",
                self.id, self.status
            )));
        }
        Ok(())
    }

    /// `PENDING|RETRYING -> QUEUED`.
    pub fn mark_queued(&mut self, priority: Priority) -> Result<(), JobError> {
        match self.status {
            JobStatus::Pending | JobStatus::Retrying => {
                self.status = JobStatus::Queued;
                self.priority = priority;
                self.version += 1;
                Ok(())
            }
            _ => Err(JobError::InvalidTransition(format!(
                "cannot enqueue job {} from {}",
                self.id, self.status
            ))),
        }
    }

    /// `QUEUED -> RUNNING`.
    pub fn mark_started(&mut self, now: DateTime<Utc>) -> Result<(), JobError> {
        if self.status != JobStatus::Queued {
            return Err(JobError::InvalidTransition(format!(
                "cannot start job {} from {}",
                self.id, self.status
            )));
        }
        self.status = JobStatus::Running;
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        self.version += 1;
        Ok(())
    }

    /// Update progress counters; only valid while `RUNNING`. Clamps
    /// `percentage` to 100 rather than rejecting an out-of-range `current`.
    pub fn apply_progress(
        &mut self,
        current: u64,
        total: Option<u64>,
        message: Option<String>,
    ) -> Result<(), JobError> {
        if self.status != JobStatus::Running {
            return Err(JobError::InvalidTransition(format!(
                "cannot update progress on job {} in {}",
                self.id, self.status
            )));
        }
        self.progress.current = current;
        if let Some(total) = total {
            self.progress.total = total;
        }
        if let Some(message) = message {
            self.progress.message = Some(message);
        }
        Ok(())
    }

    /// `RUNNING -> COMPLETED`.
    pub fn mark_completed(
        &mut self,
        items_processed: u64,
        items_saved: u64,
        items_failed: u64,
        points_consumed: u64,
        now: DateTime<Utc>,
    ) -> Result<(), JobError> {
        if self.status != JobStatus::Running {
            return Err(JobError::InvalidTransition(format!(
                "cannot complete job {} from {}",
                self.id, self.status
            )));
        }
        self.status = JobStatus::Completed;
        self.progress.items_processed = items_processed;
        self.progress.items_saved = items_saved;
        self.progress.items_failed = items_failed;
        self.progress.current = self.progress.total.max(self.progress.current);
        if self.progress.total == 0 {
            self.progress.total = self.progress.current.max(1);
            self.progress.current = self.progress.total;
        }
        self.points_consumed += points_consumed;
        self.completed_at = Some(now);
        self.actual_duration_seconds = self.started_at.map(|s| (now - s).num_seconds());
        self.version += 1;
        Ok(())
    }

    /// `RUNNING -> FAILED|RETRYING`, or a non-RUNNING job straight to
    /// `FAILED` (covers the "never ran" edge case).
    ///
    /// Returns `true` when the job should be retried by the caller (Queue
    /// Manager re-enqueues after backoff).
    pub fn mark_failed(&mut self, error: impl Into<String>, now: DateTime<Utc>) -> Result<bool, JobError> {
        if self.status.is_terminal() {
            // Already terminal: a no-op.
            return Ok(false);
        }
        let error = error.into();
        self.error_message = Some(error);

        if self.status != JobStatus::Running {
            // It never ran: fail directly, no retry.
            self.status = JobStatus::Failed;
            self.completed_at = Some(now);
            self.version += 1;
            return Ok(false);
        }

        if self.retry_count < self.max_retries {
            self.status = JobStatus::Retrying;
            self.retry_count += 1;
            self.version += 1;
            Ok(true)
        } else {
            self.status = JobStatus::Failed;
            self.completed_at = Some(now);
            self.actual_duration_seconds = self.started_at.map(|s| (now - s).num_seconds());
            self.version += 1;
            Ok(false)
        }
    }

    /// Any non-terminal status -> `CANCELLED`.
    pub fn mark_cancelled(&mut self, now: DateTime<Utc>) -> Result<(), JobError> {
        if !self.status.can_cancel() {
            return Err(JobError::InvalidTransition(format!(
                "cannot cancel job {} from {}",
                self.id, self.status
            )));
        }
        self.status = JobStatus::Cancelled;
        self.completed_at = Some(now);
        self.actual_duration_seconds = self.started_at.map(|s| (now - s).num_seconds());
        self.version += 1;
        Ok(())
    }

    /// `FAILED -> RETRYING`: a manual re-trigger distinct from the automatic
    /// retry inside [`Job::mark_failed`].
    pub fn retry(&mut self) -> Result<(), JobError> {
        if self.status != JobStatus::Failed {
            return Err(JobError::InvalidTransition(format!(
                "cannot retry job {} from {}",
                self.id, self.status
            )));
        }
        if self.retry_count >= self.max_retries {
            return Err(JobError::InvalidTransition(format!(
                "job {} has exhausted its {} retries",
                self.id, self.max_retries
            )));
        }
        self.retry_count += 1;
        self.status = JobStatus::Retrying;
        self.completed_at = None;
        self.actual_duration_seconds = None;
        self.error_message = None;
        self.version += 1;
        Ok(())
    }

    /// Exponential backoff for the next retry attempt: `60s * 2^retry_count`,
    /// capped at 3600s.
    pub fn retry_backoff_seconds(&self) -> u64 {
        retry_backoff_seconds(self.retry_count)
    }
}

/// `60 * 2^retry_count`, capped at 3600, as a free function so the Worker
/// Dispatcher can compute the delay before the job's retry count is bumped.
pub fn retry_backoff_seconds(retry_count: u32) -> u64 {
    let exp = retry_count.min(6); // 60 * 2^6 = 3840 > cap, so 6 is already saturating
    (60u64.saturating_mul(1u64 << exp)).min(3600)
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            name: String = "test-job",
        }
        set {
            id: JobId = JobId::new(1),
            user_id: UserId = UserId::new(1),
            keyword_id: Option<KeywordId> = None,
            schedule_id: Option<ScheduleId> = None,
            kind: JobKind = JobKind::AllKeywordsCrawl { limit: 50 },
            parameters: HashMap<String, String> = HashMap::new(),
            priority: Priority = Priority::Normal,
            max_retries: u32 = 3,
            timeout_seconds: u32 = DEFAULT_TIMEOUT_SECONDS,
            status: JobStatus = JobStatus::Pending,
            retry_count: u32 = 0,
            error_message: Option<String> = None,
            progress: Progress = Progress::default(),
            created_at: DateTime<Utc> = Utc::now(),
            scheduled_for: Option<DateTime<Utc>> = None,
            started_at: Option<DateTime<Utc>> = None,
            completed_at: Option<DateTime<Utc>> = None,
            actual_duration_seconds: Option<i64> = None,
            points_consumed: u64 = 0,
            version: u64 = 0,
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;

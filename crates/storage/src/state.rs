// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The State Store trait and its in-memory implementation.
//!
//! The teacher's storage crate derives a `MaterializedState` from WAL replay
//! of an `Event` log. This store keeps the same "one guarded in-memory map
//! per entity, transactional multi-row commit" shape but skips the WAL: jobs
//! here are not durable across process restarts, which is an explicit,
//! recorded simplification (a real deployment would swap this
//! implementation for a Postgres-backed one behind the same trait).

use crate::error::StoreError;
use crate::query::{JobQuery, Page};
use crawl_core::{Job, JobId, JobMetricSample, MonotonicIdGen, Notification, NotificationId, Schedule, ScheduleId, UserId};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Bundles the job write and its optional schedule-statistics and
/// notification side effects into one transaction: every state-changing
/// operation by the Lifecycle Controller covers (a) the job row, (b) an
/// optional schedule-statistics row, (c) an optional notification row.
pub struct JobTransition {
    pub job: Job,
    pub expected_job_version: u64,
    /// Present when the job just reached a terminal state and it was
    /// spawned by a schedule: `(schedule_id, succeeded)`.
    pub schedule_outcome: Option<(ScheduleId, bool)>,
    pub notification: Option<Notification>,
}

/// The four operations the core uses — create, load-by-id,
/// update-with-optimistic-check, query — plus the sibling entities
/// (schedules, notifications, metric samples) the same contract covers.
pub trait StateStore: Send + Sync + 'static {
    fn create_job(&self, job: Job) -> Result<Job, StoreError>;
    fn load_job(&self, id: JobId) -> Result<Job, StoreError>;
    fn query_jobs(&self, query: &JobQuery) -> Page<Job>;

    /// Apply a job state transition transactionally.
    /// `txn.expected_job_version` must equal the stored job's current
    /// version or the whole transaction is rejected untouched.
    fn commit_transition(&self, txn: JobTransition) -> Result<Job, StoreError>;

    fn create_schedule(&self, schedule: Schedule) -> Result<Schedule, StoreError>;
    fn load_schedule(&self, id: ScheduleId) -> Result<Schedule, StoreError>;
    fn update_schedule(&self, schedule: Schedule, expected_version: u64) -> Result<Schedule, StoreError>;
    fn query_schedules(&self, user_id: UserId) -> Vec<Schedule>;

    /// Active schedules with `next_run_at <= now`, across every user.
    fn due_schedules(&self, now: DateTime<Utc>) -> Vec<Schedule>;

    /// Count of non-terminal jobs spawned by `schedule_id`, compared against
    /// `max_concurrent_jobs` before a schedule is allowed to fire again.
    fn active_job_count_for_schedule(&self, schedule_id: ScheduleId) -> usize;

    fn create_notification(&self, notification: Notification) -> Result<Notification, StoreError>;
    fn mark_notification_sent(&self, id: NotificationId, delivered: bool, error: Option<String>) -> Result<(), StoreError>;
    fn mark_notification_read(&self, id: NotificationId) -> Result<(), StoreError>;
    fn query_notifications(&self, user_id: UserId, limit: usize) -> Vec<Notification>;

    fn record_metric_sample(&self, sample: JobMetricSample);
    fn recent_metric_samples(&self, job_id: JobId, limit: usize) -> Vec<JobMetricSample>;

    /// Cascade-delete a user's jobs, schedules, and notifications.
    fn delete_user_cascade(&self, user_id: UserId);

    /// Nullify `schedule_id` on a schedule's historical jobs without
    /// deleting them.
    fn nullify_schedule_references(&self, schedule_id: ScheduleId);

    /// Allocate the next monotonic job id.
    fn next_job_id(&self) -> JobId;
    fn next_schedule_id(&self) -> ScheduleId;
    fn next_notification_id(&self) -> NotificationId;
}

#[derive(Default)]
struct Inner {
    jobs: HashMap<JobId, Job>,
    schedules: HashMap<ScheduleId, Schedule>,
    notifications: HashMap<NotificationId, Notification>,
    metrics: HashMap<JobId, Vec<JobMetricSample>>,
}

/// Lock-guarded in-memory `StateStore`. Mirrors the teacher's
/// `MaterializedState`: one map per entity type, all reachable operations
/// taking the same lock so multi-map writes are atomic with respect to
/// other callers of this store.
pub struct InMemoryStateStore {
    inner: RwLock<Inner>,
    job_ids: MonotonicIdGen,
    schedule_ids: MonotonicIdGen,
    notification_ids: MonotonicIdGen,
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            job_ids: MonotonicIdGen::default(),
            schedule_ids: MonotonicIdGen::default(),
            notification_ids: MonotonicIdGen::default(),
        }
    }
}

const JOB: &str = "job";
const SCHEDULE: &str = "schedule";
const NOTIFICATION: &str = "notification";

impl StateStore for InMemoryStateStore {
    fn create_job(&self, job: Job) -> Result<Job, StoreError> {
        let mut inner = self.inner.write();
        inner.jobs.insert(job.id, job.clone());
        tracing::debug!(job_id = %job.id, "job created");
        Ok(job)
    }

    fn load_job(&self, id: JobId) -> Result<Job, StoreError> {
        self.inner
            .read()
            .jobs
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { entity: JOB, id: id.to_string() })
    }

    fn query_jobs(&self, query: &JobQuery) -> Page<Job> {
        let inner = self.inner.read();
        let mut matched: Vec<Job> = inner
            .jobs
            .values()
            .filter(|job| query.user_id.is_none_or(|u| job.user_id == u))
            .filter(|job| query.status.is_none_or(|s| job.status == s))
            .filter(|job| query.job_type.as_deref().is_none_or(|t| job.kind.type_name() == t))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matched.len();
        let page = matched.into_iter().skip(query.offset).take(query.limit.max(1)).collect();
        Page { items: page, total }
    }

    fn commit_transition(&self, txn: JobTransition) -> Result<Job, StoreError> {
        let mut inner = self.inner.write();

        let current_version = inner.jobs.get(&txn.job.id).map(|j| j.version).unwrap_or(0);
        if current_version != txn.expected_job_version {
            return Err(StoreError::VersionConflict {
                entity: JOB,
                id: txn.job.id.to_string(),
                expected: txn.expected_job_version,
                found: current_version,
            });
        }

        inner.jobs.insert(txn.job.id, txn.job.clone());

        if let Some((schedule_id, succeeded)) = txn.schedule_outcome {
            if let Some(schedule) = inner.schedules.get_mut(&schedule_id) {
                schedule.record_outcome(succeeded);
            }
        }

        if let Some(notification) = txn.notification {
            inner.notifications.insert(notification.id, notification);
        }

        tracing::debug!(job_id = %txn.job.id, status = %txn.job.status, "job transition committed");
        Ok(txn.job)
    }

    fn create_schedule(&self, schedule: Schedule) -> Result<Schedule, StoreError> {
        let mut inner = self.inner.write();
        inner.schedules.insert(schedule.id, schedule.clone());
        Ok(schedule)
    }

    fn load_schedule(&self, id: ScheduleId) -> Result<Schedule, StoreError> {
        self.inner
            .read()
            .schedules
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { entity: SCHEDULE, id: id.to_string() })
    }

    fn update_schedule(&self, schedule: Schedule, expected_version: u64) -> Result<Schedule, StoreError> {
        let mut inner = self.inner.write();
        let current_version = inner.schedules.get(&schedule.id).map(|s| s.version).unwrap_or(0);
        if current_version != expected_version {
            return Err(StoreError::VersionConflict {
                entity: SCHEDULE,
                id: schedule.id.to_string(),
                expected: expected_version,
                found: current_version,
            });
        }
        inner.schedules.insert(schedule.id, schedule.clone());
        Ok(schedule)
    }

    fn query_schedules(&self, user_id: UserId) -> Vec<Schedule> {
        let mut schedules: Vec<Schedule> =
            self.inner.read().schedules.values().filter(|s| s.user_id == user_id).cloned().collect();
        schedules.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        schedules
    }

    fn due_schedules(&self, now: DateTime<Utc>) -> Vec<Schedule> {
        self.inner.read().schedules.values().filter(|s| s.is_due(now)).cloned().collect()
    }

    fn active_job_count_for_schedule(&self, schedule_id: ScheduleId) -> usize {
        self.inner
            .read()
            .jobs
            .values()
            .filter(|job| job.schedule_id == Some(schedule_id) && !job.status.is_terminal())
            .count()
    }

    fn create_notification(&self, notification: Notification) -> Result<Notification, StoreError> {
        let mut inner = self.inner.write();
        inner.notifications.insert(notification.id, notification.clone());
        Ok(notification)
    }

    fn mark_notification_sent(&self, id: NotificationId, delivered: bool, error: Option<String>) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let notification = inner
            .notifications
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound { entity: NOTIFICATION, id: id.to_string() })?;
        if !delivered {
            if let Some(error) = &error {
                tracing::warn!(notification_id = %id, %error, "notification delivery failed");
            }
        }
        notification.record_delivery(delivered, error, chrono::Utc::now());
        Ok(())
    }

    fn mark_notification_read(&self, id: NotificationId) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let notification = inner
            .notifications
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound { entity: NOTIFICATION, id: id.to_string() })?;
        notification.mark_read(chrono::Utc::now());
        Ok(())
    }

    fn query_notifications(&self, user_id: UserId, limit: usize) -> Vec<Notification> {
        let mut notifications: Vec<Notification> =
            self.inner.read().notifications.values().filter(|n| n.user_id == user_id).cloned().collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notifications.truncate(limit.max(1));
        notifications
    }

    fn record_metric_sample(&self, sample: JobMetricSample) {
        let mut inner = self.inner.write();
        let samples = inner.metrics.entry(sample.job_id).or_default();
        samples.push(sample);
        if samples.len() > 100 {
            samples.remove(0);
        }
    }

    fn recent_metric_samples(&self, job_id: JobId, limit: usize) -> Vec<JobMetricSample> {
        let inner = self.inner.read();
        let Some(samples) = inner.metrics.get(&job_id) else {
            return Vec::new();
        };
        samples.iter().rev().take(limit.max(1)).copied().collect()
    }

    fn delete_user_cascade(&self, user_id: UserId) {
        let mut inner = self.inner.write();
        inner.jobs.retain(|_, job| job.user_id != user_id);
        inner.schedules.retain(|_, schedule| schedule.user_id != user_id);
        inner.notifications.retain(|_, notification| notification.user_id != user_id);
    }

    fn nullify_schedule_references(&self, schedule_id: ScheduleId) {
        let mut inner = self.inner.write();
        for job in inner.jobs.values_mut() {
            if job.schedule_id == Some(schedule_id) {
                job.schedule_id = None;
            }
        }
        inner.schedules.remove(&schedule_id);
    }

    fn next_job_id(&self) -> JobId {
        JobId::new(self.job_ids.next())
    }

    fn next_schedule_id(&self) -> ScheduleId {
        ScheduleId::new(self.schedule_ids.next())
    }

    fn next_notification_id(&self) -> NotificationId {
        NotificationId::new(self.notification_ids.next())
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composition of the Queue Manager, TTL mirrors, and pub/sub into the
//! Ephemeral Store.

use crate::pubsub::{PubSub, ALL_EVENTS_CHANNEL};
use crate::queue::{QueueEntry, QueueManager, QueueStats};
use crate::ttl::{TtlCappedList, TtlMap};
use chrono::{DateTime, Utc};
use crawl_core::{Event, JobId, JobMetricSample, JobStatus, NotificationPreferences, Priority, Progress, UserId};
use std::time::Duration;

const STATUS_TTL: Duration = Duration::from_secs(24 * 3600);
const PROGRESS_TTL: Duration = Duration::from_secs(3600);
const METRICS_TTL: Duration = Duration::from_secs(3600);
const ACTIVE_JOBS_TTL: Duration = Duration::from_secs(24 * 3600);
const QUEUE_STATS_TTL: Duration = Duration::from_secs(24 * 3600);
const USER_NOTIFICATIONS_TTL: Duration = Duration::from_secs(30 * 24 * 3600);
const NOTIFICATION_SETTINGS_TTL: Duration = Duration::from_secs(365 * 24 * 3600);
const DASHBOARD_CACHE_TTL: Duration = Duration::from_secs(60);

/// A live status+progress mirror for one job, keyed as `job_status:<id>`
/// and `job_progress:<id>`.
#[derive(Debug, Clone, PartialEq)]
pub struct JobStatusMirror {
    pub status: JobStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobProgressMirror {
    pub progress: Progress,
    pub updated_at: DateTime<Utc>,
}

/// Summary entry held in the `active_jobs` map, merging a non-terminal
/// job's stored row with its live progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveJobSummary {
    pub job_id: JobId,
    pub user_id: UserId,
    pub status: JobStatus,
    pub percentage: f64,
}

/// A user's per-notification record id, kept as a lightweight entry so the
/// capped list doesn't duplicate the full `Notification` row.
#[derive(Debug, Clone, PartialEq)]
pub struct UserNotificationEntry {
    pub notification_id: crawl_core::NotificationId,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// The Ephemeral Store: queues, short-TTL status/progress mirrors, pub/sub,
/// and per-user caches.
pub struct EphemeralStore {
    pub queues: QueueManager,
    pub pubsub: PubSub,

    job_status: TtlMap<JobId, JobStatusMirror>,
    job_progress: TtlMap<JobId, JobProgressMirror>,
    job_metrics: TtlCappedList<JobId, JobMetricSample>,
    active_jobs: TtlMap<JobId, ActiveJobSummary>,
    queue_stats: TtlMap<(), QueueStats>,
    user_notifications: TtlCappedList<UserId, UserNotificationEntry>,
    notification_settings: TtlMap<UserId, NotificationPreferences>,
    dashboard_cache: TtlMap<UserId, String>,
}

impl Default for EphemeralStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EphemeralStore {
    pub fn new() -> Self {
        Self {
            queues: QueueManager::new(),
            pubsub: PubSub::new(),
            job_status: TtlMap::new(STATUS_TTL),
            job_progress: TtlMap::new(PROGRESS_TTL),
            job_metrics: TtlCappedList::new(METRICS_TTL, 100),
            active_jobs: TtlMap::new(ACTIVE_JOBS_TTL),
            queue_stats: TtlMap::new(QUEUE_STATS_TTL),
            user_notifications: TtlCappedList::new(USER_NOTIFICATIONS_TTL, 100),
            notification_settings: TtlMap::new(NOTIFICATION_SETTINGS_TTL),
            dashboard_cache: TtlMap::new(DASHBOARD_CACHE_TTL),
        }
    }

    pub fn enqueue(&self, entry: QueueEntry) {
        self.queues.enqueue(entry);
        self.queue_stats.set((), self.queues.stats());
    }

    pub fn dequeue(&self, priority: Option<Priority>, now: DateTime<Utc>) -> Option<QueueEntry> {
        let entry = self.queues.dequeue(priority, now);
        self.queue_stats.set((), self.queues.stats());
        entry
    }

    pub fn mirror_status(&self, job_id: JobId, status: JobStatus, now: DateTime<Utc>) {
        self.job_status.set(job_id, JobStatusMirror { status, updated_at: now });
    }

    pub fn status(&self, job_id: JobId) -> Option<JobStatusMirror> {
        self.job_status.get(&job_id)
    }

    pub fn mirror_progress(&self, job_id: JobId, progress: Progress, now: DateTime<Utc>) {
        self.job_progress.set(job_id, JobProgressMirror { progress, updated_at: now });
    }

    pub fn progress(&self, job_id: JobId) -> Option<JobProgressMirror> {
        self.job_progress.get(&job_id)
    }

    pub fn record_metric_sample(&self, sample: JobMetricSample) {
        self.job_metrics.push_front(sample.job_id, sample);
    }

    pub fn recent_metric_samples(&self, job_id: JobId) -> Vec<JobMetricSample> {
        self.job_metrics.get(&job_id)
    }

    pub fn upsert_active_job(&self, summary: ActiveJobSummary) {
        self.active_jobs.set(summary.job_id, summary);
    }

    pub fn remove_active_job(&self, job_id: JobId) {
        self.active_jobs.remove(&job_id);
    }

    pub fn active_job(&self, job_id: JobId) -> Option<ActiveJobSummary> {
        self.active_jobs.get(&job_id)
    }

    pub fn queue_stats(&self) -> QueueStats {
        self.queue_stats.get(&()).unwrap_or_else(|| self.queues.stats())
    }

    pub fn push_user_notification(&self, user_id: UserId, entry: UserNotificationEntry) {
        self.user_notifications.push_front(user_id, entry);
    }

    pub fn user_notifications(&self, user_id: UserId) -> Vec<UserNotificationEntry> {
        self.user_notifications.get(&user_id)
    }

    pub fn set_notification_preferences(&self, user_id: UserId, prefs: NotificationPreferences) {
        self.notification_settings.set(user_id, prefs);
    }

    pub fn notification_preferences(&self, user_id: UserId) -> Option<NotificationPreferences> {
        self.notification_settings.get(&user_id)
    }

    /// Cache a JSON-serialized dashboard snapshot for 60s, per user.
    pub fn cache_dashboard_snapshot(&self, user_id: UserId, json: String) {
        self.dashboard_cache.set(user_id, json);
    }

    pub fn dashboard_snapshot(&self, user_id: UserId) -> Option<String> {
        self.dashboard_cache.get(&user_id)
    }

    /// Publish to the event's own channel (for live per-job/per-user UI
    /// subscribers) and to the subsystem-wide [`ALL_EVENTS_CHANNEL`] (for the
    /// Notification Router).
    pub fn publish(&self, event: Event) -> usize {
        self.pubsub.publish_to(ALL_EVENTS_CHANNEL, event.clone());
        self.pubsub.publish(event)
    }

    /// Subscribe to every lifecycle event, regardless of job or user.
    pub fn subscribe_all(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.pubsub.subscribe(ALL_EVENTS_CHANNEL)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

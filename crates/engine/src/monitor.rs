// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Monitoring View: read-only aggregation over the State Store and
//! Ephemeral Store for dashboards, active-job lists, and history.

use crawl_core::{Job, JobId, JobStatus, UserId};
use crawl_ephemeral::{EphemeralStore, QueueStats};
use crawl_storage::{JobQuery, Page, StateStore};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A page-sized cap for the "all of a user's jobs" scans the dashboard and
/// throughput aggregates run; a real deployment would push this filtering
/// into the store query instead of pulling rows client-side.
const HISTORY_SCAN_LIMIT: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub active_jobs: usize,
    pub active_schedules: usize,
    pub success_rate_24h: f64,
    pub failed_count_24h: u64,
    pub items_per_hour: f64,
    pub points_consumed_24h: u64,
    pub queue: QueueStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveJobView {
    pub job_id: JobId,
    pub user_id: UserId,
    pub status: JobStatus,
    pub percentage: f64,
    pub eta_seconds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobProgressView {
    pub job_id: JobId,
    pub status: JobStatus,
    pub current: u64,
    pub total: u64,
    pub percentage: f64,
    pub message: Option<String>,
    pub eta_seconds: Option<f64>,
}

/// Read-only aggregation layer; never mutates the State Store or Ephemeral
/// Store.
pub struct MonitoringView<S: StateStore> {
    store: Arc<S>,
    ephemeral: Arc<EphemeralStore>,
}

impl<S: StateStore> MonitoringView<S> {
    pub fn new(store: Arc<S>, ephemeral: Arc<EphemeralStore>) -> Self {
        Self { store, ephemeral }
    }

    /// Aggregate dashboard stats for `user_id`, cached 60s in the Ephemeral
    /// Store.
    pub fn dashboard(&self, user_id: UserId, now: DateTime<Utc>) -> DashboardStats {
        if let Some(json) = self.ephemeral.dashboard_snapshot(user_id) {
            if let Ok(stats) = serde_json::from_str(&json) {
                return stats;
            }
        }

        let stats = self.compute_dashboard(user_id, now);
        if let Ok(json) = serde_json::to_string(&stats) {
            self.ephemeral.cache_dashboard_snapshot(user_id, json);
        }
        stats
    }

    fn compute_dashboard(&self, user_id: UserId, now: DateTime<Utc>) -> DashboardStats {
        let jobs = self.store.query_jobs(&JobQuery::for_user(user_id).paginated(HISTORY_SCAN_LIMIT, 0)).items;
        let active_schedules = self.store.query_schedules(user_id).iter().filter(|s| s.active).count();

        let day_ago = now - ChronoDuration::hours(24);
        let hour_ago = now - ChronoDuration::hours(1);

        let active_jobs = jobs.iter().filter(|job| !job.status.is_terminal()).count();

        let terminal_last_24h: Vec<&Job> = jobs
            .iter()
            .filter(|job| job.status.is_terminal())
            .filter(|job| job.completed_at.is_some_and(|at| at >= day_ago))
            .collect();
        let completed_24h = terminal_last_24h.iter().filter(|job| job.status == JobStatus::Completed).count();
        let failed_count_24h = terminal_last_24h.iter().filter(|job| job.status == JobStatus::Failed).count() as u64;
        let success_rate_24h =
            if terminal_last_24h.is_empty() { 0.0 } else { 100.0 * completed_24h as f64 / terminal_last_24h.len() as f64 };
        let points_consumed_24h: u64 = terminal_last_24h.iter().map(|job| job.points_consumed).sum();

        let items_per_hour: u64 = jobs
            .iter()
            .filter(|job| job.status == JobStatus::Completed)
            .filter(|job| job.completed_at.is_some_and(|at| at >= hour_ago))
            .map(|job| job.progress.items_processed)
            .sum();

        DashboardStats {
            active_jobs,
            active_schedules,
            success_rate_24h,
            failed_count_24h,
            items_per_hour: items_per_hour as f64,
            points_consumed_24h,
            queue: self.ephemeral.queue_stats(),
        }
    }

    /// Non-terminal jobs for `user_id`, each merged with its live Ephemeral
    /// Store progress mirror and an ETA derived from the most recent metric
    /// sample.
    pub fn active_jobs(&self, user_id: UserId) -> Vec<ActiveJobView> {
        let jobs = self.store.query_jobs(&JobQuery::for_user(user_id).paginated(HISTORY_SCAN_LIMIT, 0)).items;
        jobs.into_iter()
            .filter(|job| !job.status.is_terminal())
            .map(|job| {
                let live = self.ephemeral.active_job(job.id);
                let percentage = live.as_ref().map_or_else(|| job.progress.percentage(), |summary| summary.percentage);
                let status = live.as_ref().map_or(job.status, |summary| summary.status);
                ActiveJobView {
                    job_id: job.id,
                    user_id: job.user_id,
                    status,
                    percentage,
                    eta_seconds: self.eta_for(job.id, job.progress.current, job.progress.total),
                }
            })
            .collect()
    }

    /// A single job's live progress and ETA, preferring the
    /// Ephemeral Store's progress mirror over the State Store's row since the
    /// mirror is updated on every tick, not just at checkpoints.
    pub fn job_progress(&self, job_id: JobId) -> Option<JobProgressView> {
        let job = self.store.load_job(job_id).ok()?;
        let progress = self.ephemeral.progress(job_id).map(|mirror| mirror.progress).unwrap_or(job.progress);

        Some(JobProgressView {
            job_id,
            status: job.status,
            current: progress.current,
            total: progress.total,
            percentage: progress.percentage(),
            message: progress.message,
            eta_seconds: self.eta_for(job_id, progress.current, progress.total),
        })
    }

    /// Paginated job history for `user_id`, most recent first, surfaced
    /// through the Monitoring View over the State Store's `query` contract.
    pub fn job_history(&self, query: &JobQuery) -> Page<Job> {
        self.store.query_jobs(query)
    }

    fn eta_for(&self, job_id: JobId, current: u64, total: u64) -> Option<f64> {
        self.ephemeral.recent_metric_samples(job_id).first().and_then(|sample| sample.eta_seconds(current, total))
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Scheduler: a single-writer loop that fires due, active schedules.

use crate::error::EngineError;
use crate::lifecycle::JobLifecycleController;
use crawl_core::{Event, Schedule};
use crawl_storage::StateStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default wake interval between scheduler ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(30);

pub struct Scheduler<S: StateStore> {
    lifecycle: Arc<JobLifecycleController<S>>,
    tick_interval: Duration,
}

impl<S: StateStore> Scheduler<S> {
    pub fn new(lifecycle: Arc<JobLifecycleController<S>>, tick_interval: Duration) -> Self {
        Self { lifecycle, tick_interval }
    }

    pub fn spawn(self: Arc<Self>, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    async fn run(&self, shutdown: CancellationToken) {
        tracing::info!("scheduler started");
        while !shutdown.is_cancelled() {
            let fired = self.tick(Utc::now());
            if fired > 0 {
                tracing::debug!(fired, "scheduler tick fired schedules");
            }
            tokio::select! {
                _ = tokio::time::sleep(self.tick_interval) => {}
                _ = shutdown.cancelled() => break,
            }
        }
        tracing::info!("scheduler stopped");
    }

    /// One scheduler pass: fire every due, active schedule whose
    /// concurrency budget allows it. Returns the number actually fired.
    pub fn tick(&self, now: DateTime<Utc>) -> usize {
        let due = self.lifecycle.store().due_schedules(now);
        let mut fired = 0;
        for schedule in due {
            let schedule_id = schedule.id;
            match self.fire(schedule, now) {
                Ok(true) => fired += 1,
                Ok(false) => {}
                Err(err) => tracing::warn!(schedule_id = %schedule_id, %err, "failed to fire schedule"),
            }
        }
        fired
    }

    fn fire(&self, schedule: Schedule, now: DateTime<Utc>) -> Result<bool, EngineError> {
        let active = self.lifecycle.store().active_job_count_for_schedule(schedule.id);
        if active >= schedule.max_concurrent_jobs as usize {
            tracing::debug!(schedule_id = %schedule.id, active, max = schedule.max_concurrent_jobs, "schedule at concurrency limit, skipping");
            return Ok(false);
        }

        let descriptor = schedule.template.instantiate(schedule.user_id, schedule.keyword_id, schedule.id);
        let job = self.lifecycle.create(descriptor, now)?;
        let priority = job.priority;
        let job = self.lifecycle.enqueue(job, priority, None)?;

        let expected_version = schedule.version;
        let mut schedule = schedule;
        schedule.record_fire(now);
        let schedule = self.lifecycle.store().update_schedule(schedule, expected_version)?;

        self.lifecycle.ephemeral().publish(Event::ScheduleFired { schedule_id: schedule.id, job_id: job.id, at: now });
        Ok(true)
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;

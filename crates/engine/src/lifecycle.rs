// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Job Lifecycle Controller: the authoritative state machine driving
//! jobs through the State Store and Ephemeral Store together.

use crate::error::EngineError;
use crawl_adapters::CancelSignal;
use crawl_core::{crosses_milestone, Event, Job, JobDescriptor, JobId, Priority};
use crawl_ephemeral::{EphemeralStore, QueueEntry};
use crawl_storage::{JobTransition, StateStore};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Drives a `Job` through PENDING -> QUEUED -> RUNNING -> {COMPLETED,
/// FAILED, CANCELLED} (optionally via RETRYING), keeping the State Store,
/// Ephemeral Store, and pub/sub channel consistent on each transition.
pub struct JobLifecycleController<S: StateStore> {
    store: Arc<S>,
    ephemeral: Arc<EphemeralStore>,
    /// Per-running-job cooperative cancel flags, registered by the Worker
    /// Dispatcher for the duration of its `execute` call.
    cancel_signals: Mutex<HashMap<JobId, CancelSignal>>,
}

impl<S: StateStore> JobLifecycleController<S> {
    pub fn new(store: Arc<S>, ephemeral: Arc<EphemeralStore>) -> Self {
        Self { store, ephemeral, cancel_signals: Mutex::new(HashMap::new()) }
    }

    /// `create(user, descriptor) -> Job`: inserts a row in PENDING.
    pub fn create(&self, descriptor: JobDescriptor, now: DateTime<Utc>) -> Result<Job, EngineError> {
        let job = Job::new(self.store.next_job_id(), descriptor, now);
        Ok(self.store.create_job(job)?)
    }

    /// `enqueue(job, priority, delay)`: PENDING|RETRYING -> QUEUED.
    pub fn enqueue(
        &self,
        mut job: Job,
        priority: Priority,
        scheduled_for: Option<DateTime<Utc>>,
    ) -> Result<Job, EngineError> {
        let expected_job_version = job.version;
        job.mark_queued(priority)?;
        let committed = self.store.commit_transition(JobTransition {
            job,
            expected_job_version,
            schedule_outcome: None,
            notification: None,
        })?;

        self.ephemeral.enqueue(QueueEntry {
            job_id: committed.id,
            priority: committed.priority,
            enqueued_at: committed.created_at,
            scheduled_for,
            job_kind: committed.kind.clone(),
            retry_count: committed.retry_count,
        });
        self.ephemeral.mirror_status(committed.id, committed.status, Utc::now());
        Ok(committed)
    }

    /// Register the cancel flag a running job's executor will poll.
    pub fn register_cancel_signal(&self, job_id: JobId, signal: CancelSignal) {
        self.cancel_signals.lock().insert(job_id, signal);
    }

    pub fn unregister_cancel_signal(&self, job_id: JobId) {
        self.cancel_signals.lock().remove(&job_id);
    }

    /// `start(job)`: QUEUED -> RUNNING.
    pub fn start(&self, mut job: Job, now: DateTime<Utc>) -> Result<Job, EngineError> {
        let expected_job_version = job.version;
        job.mark_started(now)?;
        let committed = self.store.commit_transition(JobTransition {
            job,
            expected_job_version,
            schedule_outcome: None,
            notification: None,
        })?;

        self.ephemeral.mirror_status(committed.id, committed.status, now);
        self.ephemeral.upsert_active_job(crawl_ephemeral::ActiveJobSummary {
            job_id: committed.id,
            user_id: committed.user_id,
            status: committed.status,
            percentage: committed.progress.percentage(),
        });
        self.ephemeral.publish(Event::JobStarted { job_id: committed.id, user_id: committed.user_id, at: now });
        Ok(committed)
    }

    /// `progress(job, current, total?, message?)`: Ephemeral Store write
    /// only, no durable write per tick. Returns the milestone
    /// crossed (if any) so the caller can let the Notification Router know.
    pub fn record_progress(
        &self,
        job: &mut Job,
        current: u64,
        total: Option<u64>,
        message: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Option<u8>, EngineError> {
        let previous_pct = job.progress.percentage();
        job.apply_progress(current, total, message)?;
        let current_pct = job.progress.percentage();

        self.ephemeral.mirror_progress(job.id, job.progress.clone(), now);
        self.ephemeral.upsert_active_job(crawl_ephemeral::ActiveJobSummary {
            job_id: job.id,
            user_id: job.user_id,
            status: job.status,
            percentage: current_pct,
        });

        let milestone = crosses_milestone(previous_pct, current_pct);
        if let Some(pct) = milestone {
            self.ephemeral.publish(Event::JobProgressMilestone {
                job_id: job.id,
                user_id: job.user_id,
                milestone_pct: pct,
                current: job.progress.current,
                total: job.progress.total,
                at: now,
            });
        }
        Ok(milestone)
    }

    /// Periodic checkpoint flush to the State Store, run every N seconds or
    /// on a 10% progress delta. Bumps the version so the write is itself an
    /// optimistic-concurrency-checked transition, distinct from the
    /// in-memory-only progress ticks between checkpoints.
    pub fn checkpoint(&self, job: &mut Job) -> Result<(), EngineError> {
        let expected_job_version = job.version;
        job.version += 1;
        self.store.commit_transition(JobTransition {
            job: job.clone(),
            expected_job_version,
            schedule_outcome: None,
            notification: None,
        })?;
        Ok(())
    }

    /// `complete(job)`: RUNNING -> COMPLETED.
    pub fn complete(
        &self,
        mut job: Job,
        items_processed: u64,
        items_saved: u64,
        items_failed: u64,
        points_consumed: u64,
        now: DateTime<Utc>,
    ) -> Result<Job, EngineError> {
        let expected_job_version = job.version;
        job.mark_completed(items_processed, items_saved, items_failed, points_consumed, now)?;
        let schedule_outcome = job.schedule_id.map(|id| (id, true));
        let committed = self.store.commit_transition(JobTransition {
            job,
            expected_job_version,
            schedule_outcome,
            notification: None,
        })?;

        self.finish_ephemeral(&committed, now);
        self.ephemeral.publish(Event::JobCompleted {
            job_id: committed.id,
            user_id: committed.user_id,
            items_processed: committed.progress.items_processed,
            items_saved: committed.progress.items_saved,
            at: now,
        });
        Ok(committed)
    }

    /// `fail(job, error)`: RUNNING -> FAILED|RETRYING, or direct
    /// to FAILED if the job never ran. Returns `true` if the caller (the
    /// Worker Dispatcher) should re-enqueue after backoff.
    pub fn fail(&self, mut job: Job, error: impl Into<String>, now: DateTime<Utc>) -> Result<(Job, bool), EngineError> {
        let expected_job_version = job.version;
        let should_retry = job.mark_failed(error, now)?;
        let schedule_outcome = if should_retry { None } else { job.schedule_id.map(|id| (id, false)) };
        let committed = self.store.commit_transition(JobTransition {
            job,
            expected_job_version,
            schedule_outcome,
            notification: None,
        })?;

        if should_retry {
            self.ephemeral.mirror_status(committed.id, committed.status, now);
        } else {
            self.finish_ephemeral(&committed, now);
        }
        self.ephemeral.publish(Event::JobFailed {
            job_id: committed.id,
            user_id: committed.user_id,
            error: committed.error_message.clone().unwrap_or_default(),
            will_retry: should_retry,
            at: now,
        });
        Ok((committed, should_retry))
    }

    /// `cancel(job)`: any non-terminal -> CANCELLED. Removes
    /// the job from the queue (idempotent) and trips its cancel signal if a
    /// worker currently holds it.
    pub fn cancel(&self, mut job: Job, now: DateTime<Utc>) -> Result<Job, EngineError> {
        let expected_job_version = job.version;
        job.mark_cancelled(now)?;
        let committed = self.store.commit_transition(JobTransition {
            job,
            expected_job_version,
            schedule_outcome: None,
            notification: None,
        })?;

        self.ephemeral.queues.remove(committed.id);
        if let Some(signal) = self.cancel_signals.lock().get(&committed.id) {
            signal.cancel();
        }
        self.finish_ephemeral(&committed, now);
        self.ephemeral.publish(Event::JobCancelled { job_id: committed.id, user_id: committed.user_id, at: now });
        Ok(committed)
    }

    /// `retry(job)`: terminal FAILED -> RETRYING -> QUEUED in one
    /// operation, distinct from the automatic retry inside `fail`.
    pub fn retry(&self, mut job: Job, priority: Priority, now: DateTime<Utc>) -> Result<Job, EngineError> {
        let expected_job_version = job.version;
        job.retry()?;
        job.mark_queued(priority)?;
        let committed = self.store.commit_transition(JobTransition {
            job,
            expected_job_version,
            schedule_outcome: None,
            notification: None,
        })?;

        self.ephemeral.enqueue(QueueEntry {
            job_id: committed.id,
            priority: committed.priority,
            enqueued_at: now,
            scheduled_for: None,
            job_kind: committed.kind.clone(),
            retry_count: committed.retry_count,
        });
        self.ephemeral.mirror_status(committed.id, committed.status, now);
        Ok(committed)
    }

    fn finish_ephemeral(&self, job: &Job, now: DateTime<Utc>) {
        self.ephemeral.mirror_status(job.id, job.status, now);
        self.ephemeral.mirror_progress(job.id, job.progress.clone(), now);
        self.ephemeral.remove_active_job(job.id);
        self.unregister_cancel_signal(job.id);
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn ephemeral(&self) -> &Arc<EphemeralStore> {
        &self.ephemeral
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;

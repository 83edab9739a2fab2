// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Worker Dispatcher: a pool of concurrent workers pulling from the
//! Queue Manager and driving each job through a `CrawlExecutor`.

use crate::lifecycle::JobLifecycleController;
use crawl_adapters::{CancelSignal, CrawlExecutor, ExecError, ExecErrorKind, ProgressCallback, ProgressTick};
use crawl_core::Job;
use crawl_storage::StateStore;
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Tunables for the worker pool: configurable parallelism, default 4.
#[derive(Debug, Clone, Copy)]
pub struct DispatcherConfig {
    pub concurrency: usize,
    /// How long a worker blocks on an empty queue before polling again.
    pub poll_interval: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self { concurrency: 4, poll_interval: Duration::from_secs(1) }
    }
}

/// Drives jobs from the queue to a terminal state by invoking a
/// `CrawlExecutor` for each one. A single job is never run by two workers
/// simultaneously: dequeue is destructive, and `Lifecycle::start` rejects a
/// job that isn't `Queued`.
pub struct WorkerDispatcher<S: StateStore, E: CrawlExecutor> {
    lifecycle: Arc<JobLifecycleController<S>>,
    executor: Arc<E>,
    config: DispatcherConfig,
}

impl<S: StateStore, E: CrawlExecutor> WorkerDispatcher<S, E> {
    pub fn new(lifecycle: Arc<JobLifecycleController<S>>, executor: Arc<E>, config: DispatcherConfig) -> Self {
        Self { lifecycle, executor, config }
    }

    /// Spawn `config.concurrency` worker loops that run until `shutdown` is
    /// cancelled.
    pub fn spawn(self: &Arc<Self>, shutdown: CancellationToken) -> Vec<tokio::task::JoinHandle<()>> {
        (0..self.config.concurrency)
            .map(|worker_id| {
                let dispatcher = Arc::clone(self);
                let shutdown = shutdown.clone();
                tokio::spawn(async move { dispatcher.run_worker(worker_id, shutdown).await })
            })
            .collect()
    }

    async fn run_worker(&self, worker_id: usize, shutdown: CancellationToken) {
        tracing::info!(worker_id, "worker started");
        while !shutdown.is_cancelled() {
            let now = Utc::now();
            let Some(entry) = self.lifecycle.ephemeral().dequeue(None, now) else {
                tokio::select! {
                    _ = tokio::time::sleep(self.config.poll_interval) => {}
                    _ = shutdown.cancelled() => break,
                }
                continue;
            };

            let job = match self.lifecycle.store().load_job(entry.job_id) {
                Ok(job) => job,
                Err(err) => {
                    tracing::warn!(worker_id, job_id = %entry.job_id, %err, "dropping dequeued job: not found");
                    continue;
                }
            };
            if job.status.is_terminal() {
                tracing::debug!(worker_id, job_id = %job.id, status = %job.status, "discarding terminal job from queue");
                continue;
            }

            self.run_job(worker_id, job).await;
        }
        tracing::info!(worker_id, "worker stopped");
    }

    /// Runs one job end to end: start, execute, and route the outcome back
    /// through the Lifecycle Controller.
    async fn run_job(&self, worker_id: usize, job: Job) {
        let job_id = job.id;
        let job = match self.lifecycle.start(job, Utc::now()) {
            Ok(job) => job,
            Err(err) => {
                tracing::warn!(worker_id, %job_id, %err, "could not start dequeued job");
                return;
            }
        };

        let timeout = Duration::from_secs(u64::from(job.timeout_seconds));
        let kind = job.kind.clone();

        let cancel = CancelSignal::new();
        self.lifecycle.register_cancel_signal(job_id, cancel.clone());

        let shared = Arc::new(Mutex::new(job));
        let progress_cb: ProgressCallback = {
            let shared = Arc::clone(&shared);
            let lifecycle = Arc::clone(&self.lifecycle);
            Arc::new(move |tick: ProgressTick| {
                let mut job = shared.lock();
                let now = Utc::now();
                if let Err(err) = lifecycle.record_progress(&mut job, tick.current, Some(tick.total), None, now) {
                    tracing::warn!(job_id = %job.id, %err, "failed to record progress tick");
                    return;
                }
                let elapsed = job.started_at.map(|started| (now - started).num_milliseconds()).filter(|&ms| ms > 0);
                let items_per_second = elapsed.map(|ms| tick.current as f64 / (ms as f64 / 1000.0)).unwrap_or(0.0);
                lifecycle.ephemeral().record_metric_sample(crawl_core::JobMetricSample {
                    job_id: job.id,
                    at: now,
                    cpu_percent: 0.0,
                    memory_mb: 0.0,
                    items_per_second,
                    queue_size: lifecycle.ephemeral().queues.stats().total_len() as u64,
                    active_connections: 1,
                });
            })
        };

        let outcome = tokio::time::timeout(timeout, self.executor.execute(&kind, progress_cb, cancel.clone())).await;
        let job = Arc::try_unwrap(shared).map(Mutex::into_inner).unwrap_or_else(|arc| arc.lock().clone());

        match outcome {
            Ok(Ok(result)) => self.handle_success(worker_id, job, result),
            Ok(Err(err)) => self.handle_exec_error(worker_id, job, err),
            Err(_) => {
                cancel.cancel();
                tracing::warn!(worker_id, job_id = %job.id, "job exceeded its timeout, cancelling");
                self.finish_failed(worker_id, job, "timeout: deadline exceeded");
            }
        }
    }

    fn handle_success(&self, worker_id: usize, job: Job, result: crawl_adapters::CrawlResult) {
        match self.lifecycle.complete(
            job,
            result.items_processed,
            result.items_saved,
            result.items_failed,
            result.points_consumed,
            Utc::now(),
        ) {
            Ok(job) => tracing::info!(worker_id, job_id = %job.id, "job completed"),
            Err(err) => tracing::warn!(worker_id, %err, "failed to commit job completion"),
        }
    }

    fn handle_exec_error(&self, worker_id: usize, mut job: Job, err: ExecError) {
        if err.kind == ExecErrorKind::Permanent {
            // Permanent errors skip the retry path entirely.
            job.retry_count = job.max_retries;
        }
        self.finish_failed(worker_id, job, err.message.as_str());
    }

    fn finish_failed(&self, worker_id: usize, job: Job, error: impl Into<String>) {
        let now = Utc::now();
        match self.lifecycle.fail(job, error.into(), now) {
            Ok((job, true)) => {
                let delay = job.retry_backoff_seconds();
                let priority = job.priority;
                let scheduled_for = now + chrono::Duration::seconds(delay as i64);
                tracing::info!(worker_id, job_id = %job.id, delay, "job will retry after backoff");
                if let Err(err) = self.lifecycle.enqueue(job, priority, Some(scheduled_for)) {
                    tracing::warn!(worker_id, %err, "failed to re-enqueue retried job");
                }
            }
            Ok((job, false)) => tracing::info!(worker_id, job_id = %job.id, "job failed terminally"),
            Err(err) => tracing::warn!(worker_id, %err, "failed to commit job failure"),
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The composition root's shared app state: every engine component wired
//! against the same `StateStore`/`EphemeralStore` pair.

use crate::config::DaemonConfig;
use crate::executor::SimulatedCrawlExecutor;
use crawl_adapters::LoggingNotificationSink;
use crawl_engine::{DispatcherConfig, JobLifecycleController, MonitoringView, NotificationRouter, Scheduler, WorkerDispatcher};
use crawl_ephemeral::EphemeralStore;
use crawl_storage::InMemoryStateStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct AppState {
    pub lifecycle: Arc<JobLifecycleController<InMemoryStateStore>>,
    pub monitor: MonitoringView<InMemoryStateStore>,
}

/// Everything spawned in the background: the worker pool, scheduler, and
/// notification router.
pub struct Background {
    dispatcher: Arc<WorkerDispatcher<InMemoryStateStore, SimulatedCrawlExecutor>>,
    scheduler: Arc<Scheduler<InMemoryStateStore>>,
    notifier: Arc<NotificationRouter<InMemoryStateStore, LoggingNotificationSink>>,
}

impl Background {
    pub fn spawn(&self, shutdown: CancellationToken) -> Vec<tokio::task::JoinHandle<()>> {
        let mut handles = self.dispatcher.spawn(shutdown.clone());
        handles.push(Arc::clone(&self.scheduler).spawn(shutdown.clone()));
        handles.push(Arc::clone(&self.notifier).spawn(shutdown));
        handles
    }
}

pub fn build(config: &DaemonConfig) -> (Arc<AppState>, Background) {
    let store = Arc::new(InMemoryStateStore::new());
    let ephemeral = Arc::new(EphemeralStore::new());
    let lifecycle = Arc::new(JobLifecycleController::new(Arc::clone(&store), Arc::clone(&ephemeral)));

    let dispatcher_config = DispatcherConfig { concurrency: config.worker.concurrency, poll_interval: config.worker.poll_interval() };
    let dispatcher = Arc::new(WorkerDispatcher::new(Arc::clone(&lifecycle), Arc::new(SimulatedCrawlExecutor::new()), dispatcher_config));
    let scheduler = Arc::new(Scheduler::new(Arc::clone(&lifecycle), config.scheduler.tick_interval()));
    let notifier = Arc::new(NotificationRouter::new(Arc::clone(&store), Arc::clone(&ephemeral), Arc::new(LoggingNotificationSink::new())));

    let monitor = MonitoringView::new(store, ephemeral);
    let state = Arc::new(AppState { lifecycle, monitor });
    let background = Background { dispatcher, scheduler, notifier };
    (state, background)
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;

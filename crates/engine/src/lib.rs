// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! crawl-engine: the Job Lifecycle Controller, Worker Dispatcher, Scheduler,
//! Notification Router, and Monitoring View that together drive jobs from
//! creation to a terminal state.

pub mod dispatcher;
pub mod error;
pub mod lifecycle;
pub mod monitor;
pub mod notifier;
pub mod scheduler;

pub use dispatcher::{DispatcherConfig, WorkerDispatcher};
pub use error::EngineError;
pub use lifecycle::JobLifecycleController;
pub use monitor::{ActiveJobView, DashboardStats, JobProgressView, MonitoringView};
pub use notifier::NotificationRouter;
pub use scheduler::Scheduler;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! crawl-core: domain types and state machine for the crawl job management subsystem.

pub mod macros;

pub mod error;
pub mod event;
pub mod ids;
pub mod job;
pub mod metrics;
pub mod notification;
pub mod schedule;

pub use error::JobError;
pub use event::Event;
pub use ids::{JobId, KeywordId, MonotonicIdGen, NotificationId, ScheduleId, UserId};
#[cfg(any(test, feature = "test-support"))]
pub use job::JobBuilder;
pub use job::{retry_backoff_seconds, Job, JobDescriptor, JobKind, JobStatus, Priority, Progress, DEFAULT_TIMEOUT_SECONDS};
#[cfg(any(test, feature = "test-support"))]
pub use metrics::JobMetricSampleBuilder;
pub use metrics::JobMetricSample;
#[cfg(any(test, feature = "test-support"))]
pub use notification::NotificationBuilder;
pub use notification::{
    crosses_milestone, DeliveryMethod, DeliveryStatus, Notification, NotificationPreferences,
    NotificationType, PROGRESS_MILESTONES,
};
#[cfg(any(test, feature = "test-support"))]
pub use schedule::ScheduleBuilder;
pub use schedule::{compute_next, JobTemplate, Schedule, ScheduleFrequency};

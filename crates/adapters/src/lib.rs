// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! crawl-adapters: the abstract boundary to external collaborators —
//! `CrawlExecutor`, `NotificationSink` — plus fakes for testing.

pub mod executor;
pub mod sink;

pub use executor::{CancelSignal, CrawlExecutor, CrawlResult, ExecError, ExecErrorKind, ProgressCallback, ProgressTick};
#[cfg(any(test, feature = "test-support"))]
pub use executor::{FakeCrawlExecutor, ScriptedOutcome};
pub use sink::{LoggingNotificationSink, NotificationSink, SinkError};
#[cfg(any(test, feature = "test-support"))]
pub use sink::{FakeNotificationSink, SinkCall};

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `NotificationSink`: the abstract per-channel delivery boundary the
//! Notification Router dispatches to. Real email/sms/webhook transports are
//! explicitly out of scope; only the trait and a logging stand-in live here.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("delivery failed: {0}")]
    DeliveryFailed(String),
}

/// A single outbound channel: in-app, email, SMS, or webhook.
#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    async fn send(&self, channel: &str, recipient: &str, title: &str, message: &str) -> Result<(), SinkError>;
}

/// Logs deliveries via `tracing` instead of reaching an outside transport.
/// Used as the in-app/console stand-in when no real transport is wired up.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingNotificationSink;

impl LoggingNotificationSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationSink for LoggingNotificationSink {
    async fn send(&self, channel: &str, recipient: &str, title: &str, message: &str) -> Result<(), SinkError> {
        tracing::info!(%channel, %recipient, %title, %message, "notification delivered");
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{NotificationSink, SinkError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SinkCall {
        pub channel: String,
        pub recipient: String,
        pub title: String,
        pub message: String,
    }

    struct FakeState {
        calls: Vec<SinkCall>,
        fail_next: bool,
    }

    /// Fake sink for tests; can be told to fail the next delivery.
    #[derive(Clone)]
    pub struct FakeNotificationSink {
        inner: Arc<Mutex<FakeState>>,
    }

    impl Default for FakeNotificationSink {
        fn default() -> Self {
            Self { inner: Arc::new(Mutex::new(FakeState { calls: Vec::new(), fail_next: false })) }
        }
    }

    impl FakeNotificationSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_next(&self) {
            self.inner.lock().fail_next = true;
        }

        pub fn calls(&self) -> Vec<SinkCall> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl NotificationSink for FakeNotificationSink {
        async fn send(&self, channel: &str, recipient: &str, title: &str, message: &str) -> Result<(), SinkError> {
            let mut state = self.inner.lock();
            state.calls.push(SinkCall {
                channel: channel.to_string(),
                recipient: recipient.to_string(),
                title: title.to_string(),
                message: message.to_string(),
            });
            if state.fail_next {
                state.fail_next = false;
                return Err(SinkError::DeliveryFailed("scripted failure".into()));
            }
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeNotificationSink, SinkCall};

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `CrawlExecutor`: the abstract boundary to the external Reddit-crawling
//! work the Worker Dispatcher invokes per job. Concrete executors live
//! outside this subsystem; this crate only defines the trait and a fake for
//! tests.

use async_trait::async_trait;
use crawl_core::JobKind;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Outcome of one successful execution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CrawlResult {
    pub items_processed: u64,
    pub items_saved: u64,
    pub items_failed: u64,
    pub points_consumed: u64,
}

/// Whether a failed attempt should be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecErrorKind {
    /// Network error, rate limit, upstream 5xx: worth retrying.
    Transient,
    /// Bad parameters, upstream 4xx: retrying would just fail again.
    Permanent,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ExecError {
    pub kind: ExecErrorKind,
    pub message: String,
}

impl ExecError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self { kind: ExecErrorKind::Transient, message: message.into() }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self { kind: ExecErrorKind::Permanent, message: message.into() }
    }

    pub fn is_transient(&self) -> bool {
        self.kind == ExecErrorKind::Transient
    }
}

/// One progress tick reported mid-execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressTick {
    pub current: u64,
    pub total: u64,
    pub items_saved: u64,
    pub items_failed: u64,
}

/// Callback the executor invokes as work proceeds; the dispatcher wires this
/// to `Job::apply_progress` plus the live Ephemeral Store mirror.
pub type ProgressCallback = Arc<dyn Fn(ProgressTick) + Send + Sync>;

/// Cooperative cancellation flag shared between the dispatcher and the
/// executor. The executor is expected to poll this between network calls
/// and return promptly once it is set.
#[derive(Clone, Default)]
pub struct CancelSignal(Arc<AtomicBool>);

impl CancelSignal {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Abstract external collaborator that performs the actual crawl work for a
/// job. Implementations perform network calls against the upstream API;
/// this subsystem only drives the state machine around the call.
#[async_trait]
pub trait CrawlExecutor: Send + Sync + 'static {
    async fn execute(
        &self,
        job_kind: &JobKind,
        progress: ProgressCallback,
        cancel: CancelSignal,
    ) -> Result<CrawlResult, ExecError>;
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{CancelSignal, CrawlExecutor, CrawlResult, ExecError, ProgressCallback, ProgressTick};
    use async_trait::async_trait;
    use crawl_core::JobKind;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// One scripted outcome for `FakeCrawlExecutor` to return in sequence.
    #[derive(Debug, Clone)]
    pub enum ScriptedOutcome {
        Success(CrawlResult),
        Error(ExecError),
        /// Emit the given progress ticks, then observe `cancel_signal` and
        /// return early with the items processed so far.
        CancelAfterTick { tick: ProgressTick, processed_at_cancel: u64 },
    }

    struct FakeState {
        outcomes: VecDeque<ScriptedOutcome>,
        calls: Vec<JobKind>,
    }

    /// Scripted executor for tests: returns a queued outcome per call,
    /// repeating the last one once the script is exhausted.
    #[derive(Clone)]
    pub struct FakeCrawlExecutor {
        inner: Arc<Mutex<FakeState>>,
    }

    impl FakeCrawlExecutor {
        pub fn new(outcomes: Vec<ScriptedOutcome>) -> Self {
            Self { inner: Arc::new(Mutex::new(FakeState { outcomes: outcomes.into(), calls: Vec::new() })) }
        }

        pub fn calls(&self) -> Vec<JobKind> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl CrawlExecutor for FakeCrawlExecutor {
        async fn execute(
            &self,
            job_kind: &JobKind,
            progress: ProgressCallback,
            cancel: CancelSignal,
        ) -> Result<CrawlResult, ExecError> {
            let outcome = {
                let mut state = self.inner.lock();
                state.calls.push(job_kind.clone());
                let next = state.outcomes.pop_front();
                match next {
                    Some(outcome) => {
                        if state.outcomes.is_empty() {
                            // keep repeating the final scripted outcome
                        }
                        outcome
                    }
                    None => ScriptedOutcome::Success(CrawlResult::default()),
                }
            };

            match outcome {
                ScriptedOutcome::Success(result) => Ok(result),
                ScriptedOutcome::Error(err) => Err(err),
                ScriptedOutcome::CancelAfterTick { tick, processed_at_cancel } => {
                    progress(tick);
                    while !cancel.is_cancelled() {
                        tokio::task::yield_now().await;
                    }
                    Ok(CrawlResult { items_processed: processed_at_cancel, items_saved: processed_at_cancel, items_failed: 0, points_consumed: 0 })
                }
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeCrawlExecutor, ScriptedOutcome};

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The canonical error taxonomy shared across the job management subsystem.
//!
//! Every crate boundary (storage, ephemeral, engine, daemon) eventually maps
//! its own error type into one of these kinds, so the daemon's API layer has
//! a single place to decide HTTP status codes.

use thiserror::Error;

/// A taxonomy error, independent of which crate raised it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JobError {
    /// Caller attempted a state change the FSM does not allow from the
    /// entity's current state.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// The referenced job/schedule does not exist, or does not belong to
    /// the caller.
    #[error("not found: {0}")]
    NotFound(String),

    /// A State Store or Ephemeral Store I/O failure. The retry-once-with-
    /// backoff policy belongs to whichever `StateStore` implementation can
    /// actually raise this (`InMemoryStateStore` never does); this variant
    /// and its 503 mapping exist so that implementation has somewhere to
    /// surface to once it gives up.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The external crawl API hiccuped; the FSM should retry.
    #[error("transient execution error: {0}")]
    ExecTransient(String),

    /// Bad input or an unrecoverable external condition; terminal, no retry.
    #[error("permanent execution error: {0}")]
    ExecPermanent(String),

    /// A deadline was exceeded. Treated as [`JobError::ExecTransient`] by
    /// callers (retryable).
    #[error("timeout: {0}")]
    Timeout(String),
}

impl JobError {
    /// Whether this error should drive the FSM into a retry rather than a
    /// terminal failure. `Timeout` is treated as `ExecTransient`.
    pub fn is_retryable(&self) -> bool {
        matches!(self, JobError::ExecTransient(_) | JobError::Timeout(_) | JobError::StoreUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_retryable_like_transient() {
        assert!(JobError::Timeout("deadline exceeded".into()).is_retryable());
        assert!(JobError::ExecTransient("network blip".into()).is_retryable());
        assert!(!JobError::ExecPermanent("bad parameters".into()).is_retryable());
        assert!(!JobError::InvalidTransition("already terminal".into()).is_retryable());
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors raised by the engine crate's components.

use crawl_adapters::ExecError;
use crawl_core::JobError;
use crawl_storage::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Job(#[from] JobError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("crawl execution error: {0}")]
    Exec(#[from] ExecError),
}

impl EngineError {
    /// Whether the underlying condition is worth retrying. `Timeout` folds
    /// into `ExecTransient`, which is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::Job(e) => e.is_retryable(),
            EngineError::Store(_) => false,
            EngineError::Exec(e) => e.is_transient(),
        }
    }
}

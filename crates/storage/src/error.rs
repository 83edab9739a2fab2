// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors raised by the State Store.

use crawl_core::JobError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The optimistic-concurrency check failed: another writer committed
    /// first. Of two concurrent transitions on the same job, exactly one
    /// succeeds.
    #[error("version conflict on {entity} {id}: expected {expected}, found {found}")]
    VersionConflict { entity: &'static str, id: String, expected: u64, found: u64 },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
}

impl From<StoreError> for JobError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => JobError::NotFound(format!("{entity} {id}")),
            StoreError::VersionConflict { entity, id, .. } => {
                JobError::InvalidTransition(format!("{entity} {id} already changed underneath this write"))
            }
        }
    }
}

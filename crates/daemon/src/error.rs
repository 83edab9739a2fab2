// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps the shared [`crawl_core::JobError`] taxonomy to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use crawl_core::JobError;
use crawl_engine::EngineError;
use crawl_storage::StoreError;
use serde::Serialize;

#[derive(Debug)]
pub enum ApiError {
    Job(JobError),
    /// No caller identity on the request. A pure HTTP-layer stand-in for the
    /// missing auth middleware, not part of the core job error taxonomy.
    Unauthenticated,
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Job(e) => Self::Job(e),
            EngineError::Store(e) => Self::Job(e.into()),
            EngineError::Exec(e) => Self::Job(JobError::ExecPermanent(e.to_string())),
        }
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        Self::Job(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Job(err.into())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Job(JobError::InvalidTransition(_)) => StatusCode::BAD_REQUEST,
            ApiError::Job(JobError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Job(JobError::StoreUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Job(JobError::ExecTransient(_) | JobError::ExecPermanent(_) | JobError::Timeout(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
        };
        let message = match self {
            ApiError::Job(err) => err.to_string(),
            ApiError::Unauthenticated => "missing x-user-id header".to_string(),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The HTTP API surface.

mod jobs;
mod monitoring;
mod schedules;

use crate::error::ApiError;
use crate::state::AppState;
use axum::http::HeaderMap;
use axum::routing::{get, post, put};
use axum::Router;
use crawl_core::UserId;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Stand-in for a real auth middleware: reads the caller's identity straight
/// off a header instead of validating a session or token.
pub fn caller(headers: &HeaderMap) -> Result<UserId, ApiError> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .map(UserId::new)
        .ok_or(ApiError::Unauthenticated)
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/jobs", post(jobs::create_job))
        .route("/jobs/:id/status", get(jobs::job_status))
        .route("/jobs/:id/progress", get(jobs::job_progress))
        .route("/jobs/:id/cancel", post(jobs::cancel_job))
        .route("/jobs/:id/retry", post(jobs::retry_job))
        .route("/monitoring/dashboard", get(monitoring::dashboard))
        .route("/monitoring/active-jobs", get(monitoring::active_jobs))
        .route("/monitoring/job-history", get(monitoring::job_history))
        .route("/queue/statistics", get(monitoring::queue_statistics))
        .route("/schedules", post(schedules::create_schedule).get(schedules::list_schedules))
        .route("/schedules/:id/toggle", put(schedules::toggle_schedule))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

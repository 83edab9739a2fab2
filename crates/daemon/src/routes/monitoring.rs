// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/monitoring` and `/queue` endpoints.

use super::caller;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use crawl_core::{Job, JobStatus};
use crawl_ephemeral::QueueStats;
use crawl_engine::{ActiveJobView, DashboardStats};
use crawl_storage::JobQuery;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub async fn dashboard(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<Json<DashboardStats>, ApiError> {
    let user_id = caller(&headers)?;
    Ok(Json(state.monitor.dashboard(user_id, Utc::now())))
}

pub async fn active_jobs(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<Json<Vec<ActiveJobView>>, ApiError> {
    let user_id = caller(&headers)?;
    Ok(Json(state.monitor.active_jobs(user_id)))
}

#[derive(Debug, Deserialize)]
pub struct JobHistoryParams {
    pub status: Option<JobStatus>,
    pub job_type: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    20
}

#[derive(Debug, Serialize)]
pub struct JobHistoryResponse {
    pub items: Vec<Job>,
    pub total: usize,
}

pub async fn job_history(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<JobHistoryParams>,
) -> Result<Json<JobHistoryResponse>, ApiError> {
    let user_id = caller(&headers)?;
    let mut query = JobQuery::for_user(user_id).paginated(params.limit, params.offset);
    if let Some(status) = params.status {
        query = query.with_status(status);
    }
    if let Some(job_type) = params.job_type {
        query = query.with_job_type(job_type);
    }
    let page = state.monitor.job_history(&query);
    Ok(Json(JobHistoryResponse { items: page.items, total: page.total }))
}

pub async fn queue_statistics(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<Json<QueueStats>, ApiError> {
    caller(&headers)?;
    Ok(Json(state.lifecycle.ephemeral().queue_stats()))
}

#[cfg(test)]
#[path = "monitoring_tests.rs"]
mod tests;

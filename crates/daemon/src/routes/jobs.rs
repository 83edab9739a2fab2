// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/jobs` endpoints.

use super::caller;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use crawl_core::{Job, JobDescriptor, JobId, JobKind, KeywordId, Priority};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub name: String,
    #[serde(flatten)]
    pub kind: JobKind,
    #[serde(default)]
    pub parameters: HashMap<String, String>,
    pub priority: Option<Priority>,
    pub max_retries: Option<u32>,
}

/// The job's keyword association for cascade-delete/schedule bookkeeping.
/// For a `KeywordCrawl` this is the crawl's own keyword; other kinds carry
/// no keyword association.
fn keyword_id_of(kind: &JobKind) -> Option<KeywordId> {
    match kind {
        JobKind::KeywordCrawl { keyword_id, .. } => Some(*keyword_id),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
pub struct CreateJobResponse {
    pub job_id: JobId,
    pub status: String,
    pub enqueue_result: EnqueueResult,
}

#[derive(Debug, Serialize)]
pub struct EnqueueResult {
    pub queued: bool,
    pub queue_position: i64,
}

pub async fn create_job(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<CreateJobResponse>), ApiError> {
    let user_id = caller(&headers)?;
    let priority = body.priority.unwrap_or_default();
    let now = Utc::now();
    let keyword_id = keyword_id_of(&body.kind);

    let descriptor = JobDescriptor {
        user_id,
        keyword_id,
        schedule_id: None,
        name: body.name,
        kind: body.kind,
        parameters: body.parameters,
        priority,
        max_retries: body.max_retries.unwrap_or(3),
        timeout_seconds: crawl_core::DEFAULT_TIMEOUT_SECONDS,
        scheduled_for: None,
    };

    let job = state.lifecycle.create(descriptor, now)?;
    let job = state.lifecycle.enqueue(job, priority, None)?;
    let queue_position = state.lifecycle.ephemeral().queues.position(job.id, job.priority);

    Ok((
        StatusCode::CREATED,
        Json(CreateJobResponse {
            job_id: job.id,
            status: job.status.to_string(),
            enqueue_result: EnqueueResult { queued: true, queue_position },
        }),
    ))
}

fn load_owned(state: &AppState, user_id: crawl_core::UserId, job_id: JobId) -> Result<Job, ApiError> {
    let job = state.lifecycle.store().load_job(job_id)?;
    if job.user_id != user_id {
        return Err(crawl_core::JobError::NotFound(format!("job {job_id}")).into());
    }
    Ok(job)
}

#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub db_status: String,
    pub live_status: String,
    pub progress: crawl_core::Progress,
    pub created_at: chrono::DateTime<Utc>,
    pub started_at: Option<chrono::DateTime<Utc>>,
    pub completed_at: Option<chrono::DateTime<Utc>>,
    pub retry_count: u32,
    pub points_consumed: u64,
}

pub async fn job_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<JobStatusResponse>, ApiError> {
    let user_id = caller(&headers)?;
    let job = load_owned(&state, user_id, JobId::new(id))?;
    let live_status = state.lifecycle.ephemeral().status(job.id).map_or(job.status, |mirror| mirror.status);

    Ok(Json(JobStatusResponse {
        db_status: job.status.to_string(),
        live_status: live_status.to_string(),
        progress: job.progress,
        created_at: job.created_at,
        started_at: job.started_at,
        completed_at: job.completed_at,
        retry_count: job.retry_count,
        points_consumed: job.points_consumed,
    }))
}

pub async fn job_progress(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<crawl_engine::JobProgressView>, ApiError> {
    let user_id = caller(&headers)?;
    let job_id = JobId::new(id);
    load_owned(&state, user_id, job_id)?;
    state
        .monitor
        .job_progress(job_id)
        .map(Json)
        .ok_or_else(|| crawl_core::JobError::NotFound(format!("job {job_id}")).into())
}

pub async fn cancel_job(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<Job>, ApiError> {
    let user_id = caller(&headers)?;
    let job = load_owned(&state, user_id, JobId::new(id))?;
    let job = state.lifecycle.cancel(job, Utc::now())?;
    Ok(Json(job))
}

pub async fn retry_job(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<Job>, ApiError> {
    let user_id = caller(&headers)?;
    let job = load_owned(&state, user_id, JobId::new(id))?;
    let priority = job.priority;
    let job = state.lifecycle.retry(job, priority, Utc::now())?;
    Ok(Json(job))
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;

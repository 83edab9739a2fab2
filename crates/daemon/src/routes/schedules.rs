// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/schedules` endpoints.

use super::caller;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use crawl_core::schedule::{compute_next, JobTemplate, Schedule, ScheduleFrequency};
use crawl_core::{JobKind, Priority, DEFAULT_TIMEOUT_SECONDS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct CreateScheduleRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(flatten)]
    pub kind: JobKind,
    #[serde(default)]
    pub parameters: HashMap<String, String>,
    pub priority: Option<Priority>,
    pub max_retries: Option<u32>,
    pub frequency: ScheduleFrequency,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_jobs: u32,
}

fn default_timezone() -> String {
    "UTC".into()
}

fn default_max_concurrent() -> u32 {
    1
}

pub async fn create_schedule(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateScheduleRequest>,
) -> Result<Json<Schedule>, ApiError> {
    let user_id = caller(&headers)?;
    let now = Utc::now();
    let store = state.lifecycle.store();
    let keyword_id = match &body.kind {
        JobKind::KeywordCrawl { keyword_id, .. } => Some(*keyword_id),
        _ => None,
    };

    let mut schedule = Schedule {
        id: store.next_schedule_id(),
        user_id,
        keyword_id,
        name: body.name.clone(),
        description: body.description,
        template: JobTemplate {
            name: body.name,
            kind: body.kind,
            parameters: body.parameters,
            priority: body.priority.unwrap_or_default(),
            max_retries: body.max_retries.unwrap_or(3),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        },
        frequency: body.frequency,
        timezone: body.timezone,
        max_concurrent_jobs: body.max_concurrent_jobs,
        active: true,
        created_at: now,
        next_run_at: None,
        last_run_at: None,
        total_runs: 0,
        successful_runs: 0,
        failed_runs: 0,
        version: 0,
    };
    schedule.next_run_at = Some(compute_next(now, schedule.frequency, schedule.tz()));

    let schedule = store.create_schedule(schedule)?;
    Ok(Json(schedule))
}

pub async fn list_schedules(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<Json<Vec<Schedule>>, ApiError> {
    let user_id = caller(&headers)?;
    Ok(Json(state.lifecycle.store().query_schedules(user_id)))
}

#[derive(Debug, Serialize)]
pub struct ToggleScheduleResponse {
    pub schedule: Schedule,
}

pub async fn toggle_schedule(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<ToggleScheduleResponse>, ApiError> {
    let user_id = caller(&headers)?;
    let store = state.lifecycle.store();
    let schedule_id = crawl_core::ScheduleId::new(id);
    let mut schedule = store.load_schedule(schedule_id)?;
    if schedule.user_id != user_id {
        return Err(crawl_core::JobError::NotFound(format!("schedule {schedule_id}")).into());
    }

    let expected_version = schedule.version;
    schedule.active = !schedule.active;
    if schedule.active && schedule.next_run_at.is_none() {
        let tz = schedule.tz();
        schedule.next_run_at = Some(compute_next(Utc::now(), schedule.frequency, tz));
    }
    schedule.version += 1;

    let schedule = store.update_schedule(schedule, expected_version)?;
    Ok(Json(ToggleScheduleResponse { schedule }))
}

#[cfg(test)]
#[path = "schedules_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process HTTP test harness shared by the `routes` test modules
//! (`tower::ServiceExt::oneshot` dispatch, no real TCP socket).

use crate::config::DaemonConfig;
use crate::routes::build_router;
use crate::state::{self, AppState};
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub fn test_app() -> (Router, Arc<AppState>) {
    let config = DaemonConfig::default();
    let (state, _background) = state::build(&config);
    (build_router(Arc::clone(&state)), state)
}

pub struct TestResponse {
    pub status: StatusCode,
    body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body should be valid JSON")
    }
}

async fn dispatch(app: Router, request: Request<Body>) -> TestResponse {
    let response = app.oneshot(request).await.expect("router should not fail to handle a request");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("body should be readable").to_vec();
    TestResponse { status, body }
}

pub async fn get(app: &Router, path: &str, user_id: u64) -> TestResponse {
    let request = Request::builder()
        .method("GET")
        .uri(path)
        .header("x-user-id", user_id.to_string())
        .body(Body::empty())
        .expect("valid GET request");
    dispatch(app.clone(), request).await
}

pub async fn get_unauthenticated(app: &Router, path: &str) -> TestResponse {
    let request = Request::builder().method("GET").uri(path).body(Body::empty()).expect("valid GET request");
    dispatch(app.clone(), request).await
}

pub async fn post(app: &Router, path: &str, user_id: u64, body: &Value) -> TestResponse {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("x-user-id", user_id.to_string())
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).expect("body should serialize")))
        .expect("valid POST request");
    dispatch(app.clone(), request).await
}

pub async fn put(app: &Router, path: &str, user_id: u64) -> TestResponse {
    let request = Request::builder()
        .method("PUT")
        .uri(path)
        .header("x-user-id", user_id.to_string())
        .body(Body::empty())
        .expect("valid PUT request");
    dispatch(app.clone(), request).await
}

use super::*;
use axum::body::to_bytes;

async fn status_of(err: JobError) -> StatusCode {
    ApiError::Job(err).into_response().status()
}

#[tokio::test]
async fn invalid_transition_maps_to_400() {
    assert_eq!(status_of(JobError::InvalidTransition("already terminal".into())).await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn not_found_maps_to_404() {
    assert_eq!(status_of(JobError::NotFound("job 1".into())).await, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn store_unavailable_maps_to_503() {
    assert_eq!(status_of(JobError::StoreUnavailable("timed out".into())).await, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn unauthenticated_maps_to_401() {
    assert_eq!(ApiError::Unauthenticated.into_response().status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn error_body_carries_the_display_message() {
    let response = ApiError::Job(JobError::NotFound("job 1".into())).into_response();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "not found: job 1");
}

use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use schoolmgmt::directory::{directory_router, DirectoryService, SchoolRepository};
use schoolmgmt::enrollment::{enrollment_router, EnrollmentService};
use serde_json::json;
use std::sync::Arc;

/// Every API route plus the operational endpoints, sharing one store.
pub(crate) fn with_school_routes<R>(repository: Arc<R>) -> Router
where
    R: SchoolRepository + 'static,
{
    directory_router(Arc::new(DirectoryService::new(repository.clone())))
        .merge(enrollment_router(Arc::new(EnrollmentService::new(
            repository,
        ))))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

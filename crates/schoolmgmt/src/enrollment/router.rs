use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::directory::domain::EntityId;
use crate::directory::repository::SchoolRepository;
use crate::directory::router::user_id_from_headers;
use crate::directory::validation::{FieldErrors, WriteMode};
use crate::error::ServiceError;

use super::domain::{
    CompletionRequest, EnrollmentFilter, EnrollmentInput, EnrollmentRequest, EnrollmentStats,
    EnrollmentStatus, EnrollmentView,
};
use super::service::EnrollmentService;

type EnrollmentState<R> = State<Arc<EnrollmentService<R>>>;

/// Router builder exposing enrollment CRUD, lifecycle transitions and statistics.
pub fn enrollment_router<R>(service: Arc<EnrollmentService<R>>) -> Router
where
    R: SchoolRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/enrollments",
            get(list_handler::<R>).post(enroll_handler::<R>),
        )
        .route("/api/v1/enrollments/stats", get(stats_handler::<R>))
        .route(
            "/api/v1/enrollments/:id",
            get(retrieve_handler::<R>)
                .put(replace_handler::<R>)
                .patch(patch_handler::<R>)
                .delete(delete_handler::<R>),
        )
        .route("/api/v1/enrollments/:id/drop", post(drop_handler::<R>))
        .route(
            "/api/v1/enrollments/:id/complete",
            post(complete_handler::<R>),
        )
        .route(
            "/api/v1/students/:id/enrollments",
            get(student_enrollments_handler::<R>),
        )
        .route(
            "/api/v1/courses/:id/enrollments",
            get(course_enrollments_handler::<R>),
        )
        .route("/api/v1/enroll", post(enroll_handler::<R>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatusQuery {
    status: Option<EnrollmentStatus>,
}

pub(crate) async fn list_handler<R>(
    State(service): EnrollmentState<R>,
    headers: HeaderMap,
    Query(filter): Query<EnrollmentFilter>,
) -> Result<Json<Vec<EnrollmentView>>, ServiceError>
where
    R: SchoolRepository + 'static,
{
    let actor = service.authenticate(user_id_from_headers(&headers))?;
    Ok(Json(service.list(&actor, filter)?))
}

pub(crate) async fn enroll_handler<R>(
    State(service): EnrollmentState<R>,
    headers: HeaderMap,
    Json(request): Json<EnrollmentRequest>,
) -> Result<Response, ServiceError>
where
    R: SchoolRepository + 'static,
{
    let actor = service.authenticate(user_id_from_headers(&headers))?;
    let view = service.enroll(&actor, request)?;
    Ok((StatusCode::CREATED, Json(view)).into_response())
}

pub(crate) async fn retrieve_handler<R>(
    State(service): EnrollmentState<R>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<EnrollmentView>, ServiceError>
where
    R: SchoolRepository + 'static,
{
    let actor = service.authenticate(user_id_from_headers(&headers))?;
    Ok(Json(service.retrieve(&actor, EntityId(id))?))
}

pub(crate) async fn replace_handler<R>(
    State(service): EnrollmentState<R>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(input): Json<EnrollmentInput>,
) -> Result<Json<EnrollmentView>, ServiceError>
where
    R: SchoolRepository + 'static,
{
    let actor = service.authenticate(user_id_from_headers(&headers))?;
    let view = service.update(&actor, EntityId(id), input, WriteMode::Replace)?;
    Ok(Json(view))
}

pub(crate) async fn patch_handler<R>(
    State(service): EnrollmentState<R>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(input): Json<EnrollmentInput>,
) -> Result<Json<EnrollmentView>, ServiceError>
where
    R: SchoolRepository + 'static,
{
    let actor = service.authenticate(user_id_from_headers(&headers))?;
    let view = service.update(&actor, EntityId(id), input, WriteMode::Patch)?;
    Ok(Json(view))
}

pub(crate) async fn delete_handler<R>(
    State(service): EnrollmentState<R>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<StatusCode, ServiceError>
where
    R: SchoolRepository + 'static,
{
    let actor = service.authenticate(user_id_from_headers(&headers))?;
    service.delete(&actor, EntityId(id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn drop_handler<R>(
    State(service): EnrollmentState<R>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<EnrollmentView>, ServiceError>
where
    R: SchoolRepository + 'static,
{
    let actor = service.authenticate(user_id_from_headers(&headers))?;
    Ok(Json(service.drop_enrollment(&actor, EntityId(id))?))
}

/// The body is optional; an empty one completes without touching the grade.
pub(crate) async fn complete_handler<R>(
    State(service): EnrollmentState<R>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    body: Bytes,
) -> Result<Json<EnrollmentView>, ServiceError>
where
    R: SchoolRepository + 'static,
{
    let actor = service.authenticate(user_id_from_headers(&headers))?;
    let request = parse_completion(&body)?;
    let view = service.complete_enrollment(&actor, EntityId(id), request.grade)?;
    Ok(Json(view))
}

fn parse_completion(body: &[u8]) -> Result<CompletionRequest, FieldErrors> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CompletionRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|err| FieldErrors::single("non_field_errors", format!("Invalid JSON body: {err}")))
}

pub(crate) async fn student_enrollments_handler<R>(
    State(service): EnrollmentState<R>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Query(query): Query<StatusQuery>,
) -> Result<Response, ServiceError>
where
    R: SchoolRepository + 'static,
{
    let actor = service.authenticate(user_id_from_headers(&headers))?;
    let rows = service.list_for_student(&actor, EntityId(id), query.status)?;
    Ok(Json(rows).into_response())
}

pub(crate) async fn course_enrollments_handler<R>(
    State(service): EnrollmentState<R>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Query(query): Query<StatusQuery>,
) -> Result<Response, ServiceError>
where
    R: SchoolRepository + 'static,
{
    let actor = service.authenticate(user_id_from_headers(&headers))?;
    let rows = service.list_for_course(&actor, EntityId(id), query.status)?;
    Ok(Json(rows).into_response())
}

pub(crate) async fn stats_handler<R>(
    State(service): EnrollmentState<R>,
    headers: HeaderMap,
) -> Result<Json<EnrollmentStats>, ServiceError>
where
    R: SchoolRepository + 'static,
{
    let actor = service.authenticate(user_id_from_headers(&headers))?;
    Ok(Json(service.stats(&actor)?))
}

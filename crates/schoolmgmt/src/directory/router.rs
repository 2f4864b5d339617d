use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::access::Role;
use crate::error::ServiceError;

use super::domain::{
    College, Course, Department, EntityId, Professor, ProfileInput, Student, Subject, User,
};
use super::repository::SchoolRepository;
use super::resource::Resource;
use super::service::DirectoryService;
use super::validation::{FieldErrors, WriteMode};

/// Header the authentication gateway stamps with the caller's account id.
///
/// The value is trusted as-is. Only a trusted upstream authenticator may set it, and it must
/// strip any copy sent by the client.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Account id carried by the request; absent or malformed values mean anonymous.
pub fn user_id_from_headers(headers: &HeaderMap) -> Option<EntityId> {
    headers
        .get(USER_ID_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(EntityId)
}

type DirectoryState<R> = State<Arc<DirectoryService<R>>>;

/// Router builder exposing CRUD for every directory resource plus account endpoints.
pub fn directory_router<R>(service: Arc<DirectoryService<R>>) -> Router
where
    R: SchoolRepository + 'static,
{
    Router::new()
        .merge(resource_routes::<College, R>())
        .merge(resource_routes::<Department, R>())
        .merge(resource_routes::<Course, R>())
        .merge(resource_routes::<Subject, R>())
        .merge(resource_routes::<Student, R>())
        .merge(resource_routes::<Professor, R>())
        .merge(resource_routes::<User, R>())
        .route("/api/v1/users/by_role", get(users_by_role_handler::<R>))
        .route("/api/v1/users/:id/activate", post(activate_handler::<R>))
        .route("/api/v1/users/:id/deactivate", post(deactivate_handler::<R>))
        .route("/api/v1/auth/profile", get(profile_handler::<R>))
        .route(
            "/api/v1/auth/profile/update",
            put(update_profile_handler::<R>).patch(update_profile_handler::<R>),
        )
        .with_state(service)
}

fn resource_routes<T, R>() -> Router<Arc<DirectoryService<R>>>
where
    T: Resource,
    R: SchoolRepository + 'static,
{
    let collection = format!("/api/v1/{}", T::COLLECTION);
    let item = format!("{collection}/:id");

    Router::new()
        .route(
            &collection,
            get(list_handler::<T, R>).post(create_handler::<T, R>),
        )
        .route(
            &item,
            get(retrieve_handler::<T, R>)
                .put(replace_handler::<T, R>)
                .patch(patch_handler::<T, R>)
                .delete(delete_handler::<T, R>),
        )
}

pub(crate) async fn list_handler<T, R>(
    State(service): DirectoryState<R>,
    headers: HeaderMap,
) -> Result<Json<Vec<T>>, ServiceError>
where
    T: Resource,
    R: SchoolRepository + 'static,
{
    let actor = service.authenticate(user_id_from_headers(&headers))?;
    Ok(Json(service.list::<T>(&actor)?))
}

pub(crate) async fn create_handler<T, R>(
    State(service): DirectoryState<R>,
    headers: HeaderMap,
    Json(input): Json<T::Input>,
) -> Result<Response, ServiceError>
where
    T: Resource,
    R: SchoolRepository + 'static,
{
    let actor = service.authenticate(user_id_from_headers(&headers))?;
    let record = service.create::<T>(&actor, input)?;
    Ok((StatusCode::CREATED, Json(record)).into_response())
}

pub(crate) async fn retrieve_handler<T, R>(
    State(service): DirectoryState<R>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<T>, ServiceError>
where
    T: Resource,
    R: SchoolRepository + 'static,
{
    let actor = service.authenticate(user_id_from_headers(&headers))?;
    Ok(Json(service.retrieve::<T>(&actor, EntityId(id))?))
}

pub(crate) async fn replace_handler<T, R>(
    State(service): DirectoryState<R>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(input): Json<T::Input>,
) -> Result<Json<T>, ServiceError>
where
    T: Resource,
    R: SchoolRepository + 'static,
{
    let actor = service.authenticate(user_id_from_headers(&headers))?;
    let record = service.update::<T>(&actor, EntityId(id), input, WriteMode::Replace)?;
    Ok(Json(record))
}

pub(crate) async fn patch_handler<T, R>(
    State(service): DirectoryState<R>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(input): Json<T::Input>,
) -> Result<Json<T>, ServiceError>
where
    T: Resource,
    R: SchoolRepository + 'static,
{
    let actor = service.authenticate(user_id_from_headers(&headers))?;
    let record = service.update::<T>(&actor, EntityId(id), input, WriteMode::Patch)?;
    Ok(Json(record))
}

pub(crate) async fn delete_handler<T, R>(
    State(service): DirectoryState<R>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<StatusCode, ServiceError>
where
    T: Resource,
    R: SchoolRepository + 'static,
{
    let actor = service.authenticate(user_id_from_headers(&headers))?;
    service.delete::<T>(&actor, EntityId(id))?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RoleQuery {
    role: Option<String>,
}

pub(crate) async fn users_by_role_handler<R>(
    State(service): DirectoryState<R>,
    headers: HeaderMap,
    Query(query): Query<RoleQuery>,
) -> Result<Response, ServiceError>
where
    R: SchoolRepository + 'static,
{
    let actor = service.authenticate(user_id_from_headers(&headers))?;
    let role = match query.role.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(Role::parse(raw).ok_or_else(|| {
            FieldErrors::single("role", format!("\"{raw}\" is not a valid choice."))
        })?),
    };
    Ok(Json(service.users_by_role(&actor, role)?).into_response())
}

pub(crate) async fn activate_handler<R>(
    State(service): DirectoryState<R>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, ServiceError>
where
    R: SchoolRepository + 'static,
{
    let actor = service.authenticate(user_id_from_headers(&headers))?;
    service.set_user_active(&actor, EntityId(id), true)?;
    Ok(Json(json!({ "message": "User activated successfully" })))
}

pub(crate) async fn deactivate_handler<R>(
    State(service): DirectoryState<R>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, ServiceError>
where
    R: SchoolRepository + 'static,
{
    let actor = service.authenticate(user_id_from_headers(&headers))?;
    service.set_user_active(&actor, EntityId(id), false)?;
    Ok(Json(json!({ "message": "User deactivated successfully" })))
}

pub(crate) async fn profile_handler<R>(
    State(service): DirectoryState<R>,
    headers: HeaderMap,
) -> Result<Response, ServiceError>
where
    R: SchoolRepository + 'static,
{
    let actor = service.authenticate(user_id_from_headers(&headers))?;
    Ok(Json(service.profile(&actor)?).into_response())
}

async fn update_profile_handler<R>(
    State(service): DirectoryState<R>,
    headers: HeaderMap,
    Json(input): Json<ProfileInput>,
) -> Result<Json<serde_json::Value>, ServiceError>
where
    R: SchoolRepository + 'static,
{
    let actor = service.authenticate(user_id_from_headers(&headers))?;
    let profile = service.update_profile(&actor, input)?;
    Ok(Json(json!({
        "message": "Profile updated successfully",
        "user": profile,
    })))
}

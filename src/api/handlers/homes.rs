use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::api::dto::{HomeDto, HomeRequest};
use crate::api::errors::ApiError;
use crate::api::extract::AuthUser;
use crate::AppState;

/// List the caller's homes.
#[utoipa::path(
    get,
    path = "/homes",
    responses(
        (status = 200, description = "Homes owned by the caller", body = Vec<HomeDto>),
        (status = 401, description = "Not authenticated"),
    ),
    tag = "homes"
)]
pub async fn list_homes(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Vec<HomeDto>>, ApiError> {
    Ok(Json(state.homes.list_homes(caller.id).await?))
}

/// Fetch one of the caller's homes.
#[utoipa::path(
    get,
    path = "/homes/{id}",
    params(("id" = Uuid, Path, description = "Home id")),
    responses(
        (status = 200, description = "The home", body = HomeDto),
        (status = 404, description = "No such home for this caller"),
    ),
    tag = "homes"
)]
pub async fn get_home(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<HomeDto>, ApiError> {
    Ok(Json(state.homes.get_home(caller.id, id).await?))
}

/// Create a home owned by the caller.
#[utoipa::path(
    post,
    path = "/homes",
    request_body = HomeRequest,
    responses(
        (status = 200, description = "Created home", body = HomeDto),
        (status = 400, description = "Invalid home data"),
    ),
    tag = "homes"
)]
pub async fn create_home(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(req): Json<HomeRequest>,
) -> Result<Json<HomeDto>, ApiError> {
    Ok(Json(state.homes.create_home(caller.id, req).await?))
}

/// Update one of the caller's homes.
#[utoipa::path(
    put,
    path = "/homes/{id}",
    params(("id" = Uuid, Path, description = "Home id")),
    request_body = HomeRequest,
    responses(
        (status = 200, description = "Updated home", body = HomeDto),
        (status = 404, description = "No such home for this caller"),
    ),
    tag = "homes"
)]
pub async fn update_home(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<HomeRequest>,
) -> Result<Json<HomeDto>, ApiError> {
    Ok(Json(state.homes.update_home(caller.id, id, req).await?))
}

/// Delete a home and, transitively, its rooms and devices.
#[utoipa::path(
    delete,
    path = "/homes/{id}",
    params(("id" = Uuid, Path, description = "Home id")),
    responses(
        (status = 204, description = "Home deleted"),
        (status = 404, description = "No such home for this caller"),
    ),
    tag = "homes"
)]
pub async fn delete_home(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.homes.delete_home(caller.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

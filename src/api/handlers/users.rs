use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::api::dto::{UpdateProfileRequest, UserDto};
use crate::api::errors::ApiError;
use crate::api::extract::AuthUser;
use crate::AppState;

/// List all registered users.
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "All users", body = Vec<UserDto>),
        (status = 401, description = "Not authenticated"),
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> Result<Json<Vec<UserDto>>, ApiError> {
    Ok(Json(state.users.list_users().await?))
}

/// Fetch one user by id.
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "The user", body = UserDto),
        (status = 404, description = "No such user"),
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserDto>, ApiError> {
    Ok(Json(state.users.get_user(id).await?))
}

/// The caller's own profile.
#[utoipa::path(
    get,
    path = "/users/profile",
    responses(
        (status = 200, description = "Caller profile", body = UserDto),
        (status = 401, description = "Not authenticated"),
    ),
    tag = "users"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<UserDto>, ApiError> {
    Ok(Json(state.users.get_user(caller.id).await?))
}

/// Partial update of the caller's own profile.
#[utoipa::path(
    put,
    path = "/users/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserDto),
        (status = 409, description = "Email already in use"),
    ),
    tag = "users"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserDto>, ApiError> {
    Ok(Json(state.users.update_profile(caller.id, req).await?))
}

/// Delete an account. Only the caller's own id is accepted; any other id
/// reports not found.
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 204, description = "Account deleted, owned data cascaded"),
        (status = 404, description = "No such user"),
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.users.delete_user(caller.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

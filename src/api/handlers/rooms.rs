use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::api::dto::{CreateRoomRequest, RoomDto, UpdateRoomRequest};
use crate::api::errors::ApiError;
use crate::api::extract::AuthUser;
use crate::AppState;

/// List every room across the caller's homes.
#[utoipa::path(
    get,
    path = "/rooms",
    responses(
        (status = 200, description = "Rooms across all the caller's homes", body = Vec<RoomDto>),
        (status = 401, description = "Not authenticated"),
    ),
    tag = "rooms"
)]
pub async fn list_rooms(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Vec<RoomDto>>, ApiError> {
    Ok(Json(state.rooms.list_rooms(caller.id).await?))
}

/// List the rooms of one home.
#[utoipa::path(
    get,
    path = "/rooms/home/{home_id}",
    params(("home_id" = Uuid, Path, description = "Home id")),
    responses(
        (status = 200, description = "Rooms in the home (empty if not owned)", body = Vec<RoomDto>),
    ),
    tag = "rooms"
)]
pub async fn list_home_rooms(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(home_id): Path<Uuid>,
) -> Result<Json<Vec<RoomDto>>, ApiError> {
    Ok(Json(state.rooms.list_home_rooms(caller.id, home_id).await?))
}

/// Fetch one room.
#[utoipa::path(
    get,
    path = "/rooms/{id}",
    params(("id" = Uuid, Path, description = "Room id")),
    responses(
        (status = 200, description = "The room", body = RoomDto),
        (status = 404, description = "No such room for this caller"),
    ),
    tag = "rooms"
)]
pub async fn get_room(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RoomDto>, ApiError> {
    Ok(Json(state.rooms.get_room(caller.id, id).await?))
}

/// Create a room in one of the caller's homes.
#[utoipa::path(
    post,
    path = "/rooms",
    request_body = CreateRoomRequest,
    responses(
        (status = 200, description = "Created room", body = RoomDto),
        (status = 404, description = "Target home not found for this caller"),
    ),
    tag = "rooms"
)]
pub async fn create_room(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(req): Json<CreateRoomRequest>,
) -> Result<Json<RoomDto>, ApiError> {
    Ok(Json(state.rooms.create_room(caller.id, req).await?))
}

/// Update a room.
#[utoipa::path(
    put,
    path = "/rooms/{id}",
    params(("id" = Uuid, Path, description = "Room id")),
    request_body = UpdateRoomRequest,
    responses(
        (status = 200, description = "Updated room", body = RoomDto),
        (status = 404, description = "No such room for this caller"),
    ),
    tag = "rooms"
)]
pub async fn update_room(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRoomRequest>,
) -> Result<Json<RoomDto>, ApiError> {
    Ok(Json(state.rooms.update_room(caller.id, id, req).await?))
}

/// Delete a room and, transitively, its devices.
#[utoipa::path(
    delete,
    path = "/rooms/{id}",
    params(("id" = Uuid, Path, description = "Room id")),
    responses(
        (status = 204, description = "Room deleted"),
        (status = 404, description = "No such room for this caller"),
    ),
    tag = "rooms"
)]
pub async fn delete_room(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.rooms.delete_room(caller.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

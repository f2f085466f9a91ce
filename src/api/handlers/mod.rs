pub mod auth;
pub mod devices;
pub mod homes;
pub mod rooms;
pub mod users;

use utoipa::OpenApi;

use super::dto::{
    CreateDeviceRequest, CreateRoomRequest, DeviceDto, HomeDto, HomeRequest, JwtResponse,
    LoginRequest, RefreshRequest, RegisterRequest, RoomDto, UpdateProfileRequest,
    UpdateRoomRequest, UserDto,
};
use super::errors::ErrorResponse;
use crate::db::models::{DeviceStatus, DeviceType, RoomType};

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Returns `200 OK` with `{"status":"ok"}` when the server is running.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "system"
)]
pub async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::login,
        auth::register,
        auth::refresh,
        users::list_users,
        users::get_user,
        users::get_profile,
        users::update_profile,
        users::delete_user,
        homes::list_homes,
        homes::get_home,
        homes::create_home,
        homes::update_home,
        homes::delete_home,
        rooms::list_rooms,
        rooms::list_home_rooms,
        rooms::get_room,
        rooms::create_room,
        rooms::update_room,
        rooms::delete_room,
        devices::list_devices,
        devices::list_home_devices,
        devices::create_device,
        devices::update_device_status,
        devices::delete_device,
        devices::home_power_consumption,
        health,
    ),
    components(schemas(
        LoginRequest,
        RegisterRequest,
        RefreshRequest,
        JwtResponse,
        UserDto,
        UpdateProfileRequest,
        HomeDto,
        HomeRequest,
        RoomDto,
        CreateRoomRequest,
        UpdateRoomRequest,
        DeviceDto,
        CreateDeviceRequest,
        DeviceStatus,
        DeviceType,
        RoomType,
        ErrorResponse,
    )),
    tags(
        (name = "auth",    description = "Registration and token endpoints"),
        (name = "users",   description = "User accounts and profiles"),
        (name = "homes",   description = "Home management"),
        (name = "rooms",   description = "Room management"),
        (name = "devices", description = "Device management and power aggregates"),
        (name = "system",  description = "System endpoints"),
    ),
    info(
        title = "Smart Home API",
        version = "0.1.0",
        description = "Multi-tenant REST backend for smart-home management"
    )
)]
pub struct ApiDoc;

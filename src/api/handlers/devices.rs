use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::api::dto::{CreateDeviceRequest, DeviceDto};
use crate::api::errors::ApiError;
use crate::api::extract::AuthUser;
use crate::db::models::DeviceStatus;
use crate::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct StatusParams {
    pub status: DeviceStatus,
}

/// List every device across the caller's homes.
#[utoipa::path(
    get,
    path = "/devices",
    responses(
        (status = 200, description = "Devices across all the caller's homes", body = Vec<DeviceDto>),
        (status = 401, description = "Not authenticated"),
    ),
    tag = "devices"
)]
pub async fn list_devices(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Vec<DeviceDto>>, ApiError> {
    Ok(Json(state.devices.list_devices(caller.id).await?))
}

/// List the devices of one home.
#[utoipa::path(
    get,
    path = "/devices/home/{home_id}",
    params(("home_id" = Uuid, Path, description = "Home id")),
    responses(
        (status = 200, description = "Devices in the home (empty if not owned)", body = Vec<DeviceDto>),
    ),
    tag = "devices"
)]
pub async fn list_home_devices(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(home_id): Path<Uuid>,
) -> Result<Json<Vec<DeviceDto>>, ApiError> {
    Ok(Json(state.devices.list_home_devices(caller.id, home_id).await?))
}

/// Register a device in one of the caller's homes. New devices start OFFLINE.
#[utoipa::path(
    post,
    path = "/devices",
    request_body = CreateDeviceRequest,
    responses(
        (status = 200, description = "Created device", body = DeviceDto),
        (status = 404, description = "Target home or room not found for this caller"),
        (status = 409, description = "External device identifier already registered"),
    ),
    tag = "devices"
)]
pub async fn create_device(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(req): Json<CreateDeviceRequest>,
) -> Result<Json<DeviceDto>, ApiError> {
    Ok(Json(state.devices.create_device(caller.id, req).await?))
}

/// Set the device status (partial update, status field only).
#[utoipa::path(
    patch,
    path = "/devices/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Device id"),
        StatusParams,
    ),
    responses(
        (status = 200, description = "Updated device", body = DeviceDto),
        (status = 404, description = "No such device for this caller"),
        (status = 409, description = "Concurrent modification, retry"),
    ),
    tag = "devices"
)]
pub async fn update_device_status(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
    Query(params): Query<StatusParams>,
) -> Result<Json<DeviceDto>, ApiError> {
    Ok(Json(
        state.devices.update_status(caller.id, id, params.status).await?,
    ))
}

/// Delete a device.
#[utoipa::path(
    delete,
    path = "/devices/{id}",
    params(("id" = Uuid, Path, description = "Device id")),
    responses(
        (status = 204, description = "Device deleted"),
        (status = 404, description = "No such device for this caller"),
    ),
    tag = "devices"
)]
pub async fn delete_device(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.devices.delete_device(caller.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Total wattage of the home's devices currently ONLINE.
#[utoipa::path(
    get,
    path = "/devices/home/{home_id}/power-consumption",
    params(("home_id" = Uuid, Path, description = "Home id")),
    responses(
        (status = 200, description = "Summed watts over ONLINE devices", body = f64),
        (status = 404, description = "No such home for this caller"),
    ),
    tag = "devices"
)]
pub async fn home_power_consumption(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(home_id): Path<Uuid>,
) -> Result<Json<f64>, ApiError> {
    Ok(Json(
        state.devices.home_power_consumption(caller.id, home_id).await?,
    ))
}

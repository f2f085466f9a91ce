use std::time::Duration;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::api::dto::{CreateDeviceRequest, DeviceDto};
use crate::api::errors::ApiError;
use crate::cache::{keys, Cache};
use crate::db::models::{Device, DeviceStatus};

const CACHE_TTL: Duration = Duration::from_secs(30 * 60);
/// The power aggregate tracks live device state, so it expires faster.
const POWER_CACHE_TTL: Duration = Duration::from_secs(10 * 60);

/// Device CRUD plus the per-home power aggregate. Ownership is transitive
/// through the device's home; status updates use the device's version column
/// for optimistic concurrency.
#[derive(Clone)]
pub struct DeviceService {
    pool: PgPool,
    cache: Cache,
}

impl DeviceService {
    pub fn new(pool: PgPool, cache: Cache) -> Self {
        Self { pool, cache }
    }

    pub async fn list_devices(&self, user_id: Uuid) -> Result<Vec<DeviceDto>, ApiError> {
        let key = keys::user_devices(user_id);
        if let Some(cached) = self.cache.get::<Vec<DeviceDto>>(&key).await {
            return Ok(cached);
        }

        let devices: Vec<Device> = sqlx::query_as(
            "SELECT d.* FROM devices d \
             JOIN homes h ON h.id = d.home_id \
             WHERE h.user_id = $1 \
             ORDER BY d.created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        let devices: Vec<DeviceDto> = devices.into_iter().map(Into::into).collect();

        self.cache.put(&key, &devices, CACHE_TTL).await;
        Ok(devices)
    }

    /// Devices of one home. A home the caller does not own yields an empty
    /// list, the same as a home with no devices.
    pub async fn list_home_devices(
        &self,
        user_id: Uuid,
        home_id: Uuid,
    ) -> Result<Vec<DeviceDto>, ApiError> {
        let key = keys::home_devices(home_id, user_id);
        if let Some(cached) = self.cache.get::<Vec<DeviceDto>>(&key).await {
            return Ok(cached);
        }

        let devices: Vec<Device> = sqlx::query_as(
            "SELECT d.* FROM devices d \
             JOIN homes h ON h.id = d.home_id \
             WHERE d.home_id = $1 AND h.user_id = $2 \
             ORDER BY d.created_at",
        )
        .bind(home_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        let devices: Vec<DeviceDto> = devices.into_iter().map(Into::into).collect();

        self.cache.put(&key, &devices, CACHE_TTL).await;
        Ok(devices)
    }

    /// New devices always start OFFLINE regardless of the request payload.
    pub async fn create_device(
        &self,
        user_id: Uuid,
        req: CreateDeviceRequest,
    ) -> Result<DeviceDto, ApiError> {
        if req.name.trim().is_empty() {
            return Err(ApiError::Validation("Device name cannot be empty".to_owned()));
        }
        if req.device_id.trim().is_empty() {
            return Err(ApiError::Validation(
                "External device identifier cannot be empty".to_owned(),
            ));
        }
        if req.power_consumption < 0.0 {
            return Err(ApiError::Validation(
                "Power consumption cannot be negative".to_owned(),
            ));
        }

        let owns_home: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM homes WHERE id = $1 AND user_id = $2)")
                .bind(req.home_id)
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        if !owns_home {
            return Err(ApiError::NotFound("Home not found".to_owned()));
        }

        if let Some(room_id) = req.room_id {
            let room_in_home: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM rooms WHERE id = $1 AND home_id = $2)")
                    .bind(room_id)
                    .bind(req.home_id)
                    .fetch_one(&self.pool)
                    .await?;
            if !room_in_home {
                return Err(ApiError::NotFound("Room not found".to_owned()));
            }
        }

        let device: Device = sqlx::query_as(
            "INSERT INTO devices \
                 (name, device_id, device_type, status, home_id, room_id, \
                  manufacturer, model, power_consumption) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING *",
        )
        .bind(&req.name)
        .bind(&req.device_id)
        .bind(req.device_type)
        .bind(DeviceStatus::Offline)
        .bind(req.home_id)
        .bind(req.room_id)
        .bind(&req.manufacturer)
        .bind(&req.model)
        .bind(req.power_consumption)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            ApiError::conflict_on_unique(e, "A device with this identifier already exists")
        })?;

        info!(device_id = %device.id, home_id = %req.home_id, user_id = %user_id, "device created");
        for key in [
            keys::user_devices(user_id),
            keys::home_devices(req.home_id, user_id),
            keys::home_power(req.home_id),
        ] {
            self.cache.evict(&key).await;
        }

        Ok(device.into())
    }

    /// Partial update limited to the status field. The update is conditioned
    /// on the version observed at read time; a concurrent writer that got in
    /// first makes this call fail with a conflict so the caller can retry.
    pub async fn update_status(
        &self,
        user_id: Uuid,
        device_id: Uuid,
        status: DeviceStatus,
    ) -> Result<DeviceDto, ApiError> {
        let device: Option<Device> = sqlx::query_as(
            "SELECT d.* FROM devices d \
             JOIN homes h ON h.id = d.home_id \
             WHERE d.id = $1 AND h.user_id = $2",
        )
        .bind(device_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        let device = device.ok_or_else(|| ApiError::NotFound("Device not found".to_owned()))?;

        let updated: DeviceDto = self
            .apply_status(device_id, device.version, status)
            .await?
            .into();

        info!(device_id = %device_id, status = %status, user_id = %user_id, "device status updated");
        for key in [
            keys::user_devices(user_id),
            keys::home_devices(updated.home_id, user_id),
            keys::home_power(updated.home_id),
        ] {
            self.cache.evict(&key).await;
        }

        Ok(updated)
    }

    /// The versioned write behind `update_status`. Zero rows affected means
    /// another writer bumped the version after it was read.
    async fn apply_status(
        &self,
        device_id: Uuid,
        seen_version: i64,
        status: DeviceStatus,
    ) -> Result<Device, ApiError> {
        let updated: Option<Device> = sqlx::query_as(
            "UPDATE devices \
             SET status = $1, version = version + 1, updated_at = now() \
             WHERE id = $2 AND version = $3 \
             RETURNING *",
        )
        .bind(status)
        .bind(device_id)
        .bind(seen_version)
        .fetch_optional(&self.pool)
        .await?;
        updated.ok_or_else(|| ApiError::Conflict("Device was modified concurrently".to_owned()))
    }

    pub async fn delete_device(&self, user_id: Uuid, device_id: Uuid) -> Result<(), ApiError> {
        let device: Option<Device> = sqlx::query_as(
            "DELETE FROM devices d \
             USING homes h \
             WHERE d.id = $1 AND d.home_id = h.id AND h.user_id = $2 \
             RETURNING d.*",
        )
        .bind(device_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        let device = device.ok_or_else(|| ApiError::NotFound("Device not found".to_owned()))?;

        info!(device_id = %device_id, user_id = %user_id, "device deleted");
        for key in [
            keys::user_devices(user_id),
            keys::home_devices(device.home_id, user_id),
            keys::home_power(device.home_id),
        ] {
            self.cache.evict(&key).await;
        }

        Ok(())
    }

    /// Sum of `power_consumption` over the home's devices currently ONLINE.
    /// 0.0 when nothing is online.
    pub async fn home_power_consumption(
        &self,
        user_id: Uuid,
        home_id: Uuid,
    ) -> Result<f64, ApiError> {
        let owns_home: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM homes WHERE id = $1 AND user_id = $2)")
                .bind(home_id)
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        if !owns_home {
            return Err(ApiError::NotFound("Home not found".to_owned()));
        }

        let key = keys::home_power(home_id);
        if let Some(cached) = self.cache.get::<f64>(&key).await {
            return Ok(cached);
        }

        let total: f64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(power_consumption), 0.0) \
             FROM devices \
             WHERE home_id = $1 AND status = $2",
        )
        .bind(home_id)
        .bind(DeviceStatus::Online)
        .fetch_one(&self.pool)
        .await?;

        self.cache.put(&key, &total, POWER_CACHE_TTL).await;
        Ok(total)
    }
}

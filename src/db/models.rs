use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums (mirror the Postgres enum types)
// ---------------------------------------------------------------------------

/// Mirrors the `device_status` Postgres enum.
///
/// Status transitions are unrestricted: any value may be set at any time.
/// Only `Online` devices count towards a home's power-consumption sum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "device_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceStatus {
    Online,
    Offline,
    Active,
    Idle,
    Error,
    Updating,
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeviceStatus::Online => "ONLINE",
            DeviceStatus::Offline => "OFFLINE",
            DeviceStatus::Active => "ACTIVE",
            DeviceStatus::Idle => "IDLE",
            DeviceStatus::Error => "ERROR",
            DeviceStatus::Updating => "UPDATING",
        };
        f.write_str(s)
    }
}

/// Mirrors the `device_type` Postgres enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "device_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceType {
    Light,
    Thermostat,
    Camera,
    Lock,
    Sensor,
    Plug,
    Speaker,
    Appliance,
    Other,
}

/// Mirrors the `room_type` Postgres enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "room_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomType {
    LivingRoom,
    Bedroom,
    Kitchen,
    Bathroom,
    Office,
    Garage,
    DiningRoom,
    GuestRoom,
    KidsRoom,
    MasterBedroom,
    LaundryRoom,
    Basement,
    Attic,
    Patio,
    Balcony,
    Hallway,
    Other,
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Home {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub timezone: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Room {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub room_type: RoomType,
    pub home_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Device {
    pub id: Uuid,
    pub name: String,
    /// External device identifier (manufacturer-assigned, globally unique).
    pub device_id: String,
    pub device_type: DeviceType,
    pub status: DeviceStatus,
    pub home_id: Uuid,
    pub room_id: Option<Uuid>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    /// Instantaneous draw in watts.
    pub power_consumption: f64,
    /// Optimistic-lock counter, bumped on every update.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_status_serialises_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&DeviceStatus::Online).unwrap(),
            "\"ONLINE\""
        );
        assert_eq!(
            serde_json::to_string(&DeviceStatus::Updating).unwrap(),
            "\"UPDATING\""
        );
    }

    #[test]
    fn device_status_display_matches_wire_form() {
        for status in [
            DeviceStatus::Online,
            DeviceStatus::Offline,
            DeviceStatus::Active,
            DeviceStatus::Idle,
            DeviceStatus::Error,
            DeviceStatus::Updating,
        ] {
            let wire = serde_json::to_string(&status).unwrap();
            assert_eq!(wire.trim_matches('"'), status.to_string());
        }
    }

    #[test]
    fn room_type_round_trips_through_json() {
        let json = serde_json::to_string(&RoomType::MasterBedroom).unwrap();
        assert_eq!(json, "\"MASTER_BEDROOM\"");
        let back: RoomType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RoomType::MasterBedroom);
    }
}

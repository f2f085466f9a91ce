use std::time::Duration;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::api::dto::{CreateRoomRequest, RoomDto, UpdateRoomRequest};
use crate::api::errors::ApiError;
use crate::cache::{keys, Cache};
use crate::db::models::Room;

const CACHE_TTL: Duration = Duration::from_secs(10 * 60);

/// Room CRUD. Ownership is transitive: every query joins through the room's
/// home to `homes.user_id`.
#[derive(Clone)]
pub struct RoomService {
    pool: PgPool,
    cache: Cache,
}

impl RoomService {
    pub fn new(pool: PgPool, cache: Cache) -> Self {
        Self { pool, cache }
    }

    pub async fn list_rooms(&self, user_id: Uuid) -> Result<Vec<RoomDto>, ApiError> {
        let key = keys::user_rooms(user_id);
        if let Some(cached) = self.cache.get::<Vec<RoomDto>>(&key).await {
            return Ok(cached);
        }

        let rooms: Vec<Room> = sqlx::query_as(
            "SELECT r.* FROM rooms r \
             JOIN homes h ON h.id = r.home_id \
             WHERE h.user_id = $1 \
             ORDER BY r.created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        let rooms: Vec<RoomDto> = rooms.into_iter().map(Into::into).collect();

        self.cache.put(&key, &rooms, CACHE_TTL).await;
        Ok(rooms)
    }

    /// Rooms of one home. A home the caller does not own yields an empty
    /// list, the same as a home with no rooms.
    pub async fn list_home_rooms(
        &self,
        user_id: Uuid,
        home_id: Uuid,
    ) -> Result<Vec<RoomDto>, ApiError> {
        let key = keys::home_rooms(home_id, user_id);
        if let Some(cached) = self.cache.get::<Vec<RoomDto>>(&key).await {
            return Ok(cached);
        }

        let rooms: Vec<Room> = sqlx::query_as(
            "SELECT r.* FROM rooms r \
             JOIN homes h ON h.id = r.home_id \
             WHERE r.home_id = $1 AND h.user_id = $2 \
             ORDER BY r.created_at",
        )
        .bind(home_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        let rooms: Vec<RoomDto> = rooms.into_iter().map(Into::into).collect();

        self.cache.put(&key, &rooms, CACHE_TTL).await;
        Ok(rooms)
    }

    pub async fn get_room(&self, user_id: Uuid, room_id: Uuid) -> Result<RoomDto, ApiError> {
        let key = keys::room(room_id, user_id);
        if let Some(cached) = self.cache.get::<RoomDto>(&key).await {
            return Ok(cached);
        }

        let room: Option<Room> = sqlx::query_as(
            "SELECT r.* FROM rooms r \
             JOIN homes h ON h.id = r.home_id \
             WHERE r.id = $1 AND h.user_id = $2",
        )
        .bind(room_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        let room: RoomDto = room
            .ok_or_else(|| ApiError::NotFound("Room not found".to_owned()))?
            .into();

        self.cache.put(&key, &room, CACHE_TTL).await;
        Ok(room)
    }

    pub async fn create_room(
        &self,
        user_id: Uuid,
        req: CreateRoomRequest,
    ) -> Result<RoomDto, ApiError> {
        if req.name.trim().is_empty() {
            return Err(ApiError::Validation("Room name cannot be empty".to_owned()));
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

        let room: Room = sqlx::query_as(
            "INSERT INTO rooms (name, description, room_type, home_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING *",
        )
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.room_type)
        .bind(req.home_id)
        .fetch_one(&self.pool)
        .await?;

        info!(room_id = %room.id, home_id = %req.home_id, user_id = %user_id, "room created");
        self.cache.evict(&keys::user_rooms(user_id)).await;
        self.cache.evict(&keys::home_rooms(req.home_id, user_id)).await;

        Ok(room.into())
    }

    pub async fn update_room(
        &self,
        user_id: Uuid,
        room_id: Uuid,
        req: UpdateRoomRequest,
    ) -> Result<RoomDto, ApiError> {
        if req.name.trim().is_empty() {
            return Err(ApiError::Validation("Room name cannot be empty".to_owned()));
        }

        let room: Option<Room> = sqlx::query_as(
            "UPDATE rooms r \
             SET name = $1, description = $2, room_type = $3, updated_at = now() \
             FROM homes h \
             WHERE r.id = $4 AND r.home_id = h.id AND h.user_id = $5 \
             RETURNING r.*",
        )
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.room_type)
        .bind(room_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        let room: RoomDto = room
            .ok_or_else(|| ApiError::NotFound("Room not found".to_owned()))?
            .into();

        info!(room_id = %room_id, user_id = %user_id, "room updated");
        self.cache.put(&keys::room(room_id, user_id), &room, CACHE_TTL).await;
        self.cache.evict(&keys::user_rooms(user_id)).await;
        self.cache.evict(&keys::home_rooms(room.home_id, user_id)).await;

        Ok(room)
    }

    /// Deletes the room; its devices cascade in the store, so the device
    /// lists and the home's power aggregate are evicted too.
    pub async fn delete_room(&self, user_id: Uuid, room_id: Uuid) -> Result<(), ApiError> {
        let room: Option<Room> = sqlx::query_as(
            "DELETE FROM rooms r \
             USING homes h \
             WHERE r.id = $1 AND r.home_id = h.id AND h.user_id = $2 \
             RETURNING r.*",
        )
        .bind(room_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        let room = room.ok_or_else(|| ApiError::NotFound("Room not found".to_owned()))?;

        info!(room_id = %room_id, user_id = %user_id, "room deleted");
        for key in [
            keys::room(room_id, user_id),
            keys::user_rooms(user_id),
            keys::home_rooms(room.home_id, user_id),
            keys::user_devices(user_id),
            keys::home_devices(room.home_id, user_id),
            keys::home_power(room.home_id),
        ] {
            self.cache.evict(&key).await;
        }

        Ok(())
    }
}

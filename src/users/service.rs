use std::time::Duration;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::api::dto::{UpdateProfileRequest, UserDto};
use crate::api::errors::ApiError;
use crate::cache::{keys, Cache, CacheKey};
use crate::db::models::User;

const CACHE_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
    cache: Cache,
}

impl UserService {
    pub fn new(pool: PgPool, cache: Cache) -> Self {
        Self { pool, cache }
    }

    pub async fn list_users(&self) -> Result<Vec<UserDto>, ApiError> {
        let key = keys::all_users();
        if let Some(cached) = self.cache.get::<Vec<UserDto>>(&key).await {
            return Ok(cached);
        }

        let users: Vec<User> = sqlx::query_as("SELECT * FROM users ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;
        let users: Vec<UserDto> = users.into_iter().map(Into::into).collect();

        self.cache.put(&key, &users, CACHE_TTL).await;
        Ok(users)
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<UserDto, ApiError> {
        let key = keys::user(user_id);
        if let Some(cached) = self.cache.get::<UserDto>(&key).await {
            return Ok(cached);
        }

        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        let user: UserDto = user
            .ok_or_else(|| ApiError::NotFound("User not found".to_owned()))?
            .into();

        self.cache.put(&key, &user, CACHE_TTL).await;
        Ok(user)
    }

    /// Partial update of the caller's own profile. A requested email that
    /// belongs to another account is a conflict.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        req: UpdateProfileRequest,
    ) -> Result<UserDto, ApiError> {
        if let Some(email) = &req.email {
            if !email.contains('@') {
                return Err(ApiError::Validation("Invalid email format".to_owned()));
            }
            let email_taken: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND id <> $2)",
            )
            .bind(email)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
            if email_taken {
                return Err(ApiError::Conflict("Email is already in use".to_owned()));
            }
        }

        let user: Option<User> = sqlx::query_as(
            "UPDATE users \
             SET first_name = COALESCE($1, first_name), \
                 last_name  = COALESCE($2, last_name), \
                 email      = COALESCE($3, email) \
             WHERE id = $4 \
             RETURNING *",
        )
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(&req.email)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ApiError::conflict_on_unique(e, "Email is already in use"))?;
        let user: UserDto = user
            .ok_or_else(|| ApiError::NotFound("User not found".to_owned()))?
            .into();

        info!(user_id = %user_id, "profile updated");
        self.cache.put(&keys::user(user_id), &user, CACHE_TTL).await;
        self.cache.evict(&keys::all_users()).await;

        Ok(user)
    }

    /// Whether the account row still exists. The auth layer checks this on
    /// every request so tokens of deleted accounts stop working immediately.
    pub async fn exists(&self, user_id: Uuid) -> Result<bool, ApiError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Self-delete only. Deleting any other account reports not found, the
    /// same as a nonexistent id, so account existence never leaks.
    pub async fn delete_user(&self, caller_id: Uuid, user_id: Uuid) -> Result<(), ApiError> {
        if caller_id != user_id {
            return Err(ApiError::NotFound("User not found".to_owned()));
        }

        // Home and room ids are needed up front: their cache keys cannot be
        // rebuilt after the cascade removes the rows.
        let home_ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM homes WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        let room_ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT r.id FROM rooms r \
             JOIN homes h ON h.id = r.home_id \
             WHERE h.user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("User not found".to_owned()));
        }

        info!(user_id = %user_id, "user deleted");
        for key in account_eviction_keys(user_id, &home_ids, &room_ids) {
            self.cache.evict(&key).await;
        }

        Ok(())
    }
}

/// Every key on an account deletion: the user entry, the global list, the
/// account-wide list caches, and per home its lookup, child lists, power
/// aggregate, plus each room's direct lookup.
fn account_eviction_keys(user_id: Uuid, home_ids: &[Uuid], room_ids: &[Uuid]) -> Vec<CacheKey> {
    let mut evict = vec![
        keys::user(user_id),
        keys::all_users(),
        keys::user_homes(user_id),
        keys::user_rooms(user_id),
        keys::user_devices(user_id),
    ];
    for &home_id in home_ids {
        evict.push(keys::home(home_id, user_id));
        evict.push(keys::home_rooms(home_id, user_id));
        evict.push(keys::home_devices(home_id, user_id));
        evict.push(keys::home_power(home_id));
    }
    evict.extend(room_ids.iter().map(|&room_id| keys::room(room_id, user_id)));
    evict
}

use std::time::Duration;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::api::dto::{HomeDto, HomeRequest};
use crate::api::errors::ApiError;
use crate::cache::{keys, Cache, CacheKey};
use crate::db::models::Home;

const CACHE_TTL: Duration = Duration::from_secs(10 * 60);

/// Home CRUD, tenant-scoped by `homes.user_id`. A home another user owns is
/// reported as not found, never as forbidden.
#[derive(Clone)]
pub struct HomeService {
    pool: PgPool,
    cache: Cache,
}

impl HomeService {
    pub fn new(pool: PgPool, cache: Cache) -> Self {
        Self { pool, cache }
    }

    pub async fn list_homes(&self, user_id: Uuid) -> Result<Vec<HomeDto>, ApiError> {
        let key = keys::user_homes(user_id);
        if let Some(cached) = self.cache.get::<Vec<HomeDto>>(&key).await {
            return Ok(cached);
        }

        let homes: Vec<Home> =
            sqlx::query_as("SELECT * FROM homes WHERE user_id = $1 ORDER BY created_at")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        let homes: Vec<HomeDto> = homes.into_iter().map(Into::into).collect();

        self.cache.put(&key, &homes, CACHE_TTL).await;
        Ok(homes)
    }

    pub async fn get_home(&self, user_id: Uuid, home_id: Uuid) -> Result<HomeDto, ApiError> {
        let key = keys::home(home_id, user_id);
        if let Some(cached) = self.cache.get::<HomeDto>(&key).await {
            return Ok(cached);
        }

        let home: Option<Home> = sqlx::query_as("SELECT * FROM homes WHERE id = $1 AND user_id = $2")
            .bind(home_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        let home: HomeDto = home
            .ok_or_else(|| ApiError::NotFound("Home not found".to_owned()))?
            .into();

        self.cache.put(&key, &home, CACHE_TTL).await;
        Ok(home)
    }

    pub async fn create_home(&self, user_id: Uuid, req: HomeRequest) -> Result<HomeDto, ApiError> {
        validate_home(&req)?;

        let home: Home = sqlx::query_as(
            "INSERT INTO homes (name, address, timezone, user_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING *",
        )
        .bind(&req.name)
        .bind(&req.address)
        .bind(req.timezone.as_deref().unwrap_or("UTC"))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        info!(home_id = %home.id, user_id = %user_id, "home created");
        self.cache.evict(&keys::user_homes(user_id)).await;

        Ok(home.into())
    }

    pub async fn update_home(
        &self,
        user_id: Uuid,
        home_id: Uuid,
        req: HomeRequest,
    ) -> Result<HomeDto, ApiError> {
        validate_home(&req)?;

        let home: Option<Home> = sqlx::query_as(
            "UPDATE homes \
             SET name = $1, address = $2, timezone = COALESCE($3, timezone), updated_at = now() \
             WHERE id = $4 AND user_id = $5 \
             RETURNING *",
        )
        .bind(&req.name)
        .bind(&req.address)
        .bind(&req.timezone)
        .bind(home_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        let home: HomeDto = home
            .ok_or_else(|| ApiError::NotFound("Home not found".to_owned()))?
            .into();

        info!(home_id = %home_id, user_id = %user_id, "home updated");
        self.cache.put(&keys::home(home_id, user_id), &home, CACHE_TTL).await;
        self.cache.evict(&keys::user_homes(user_id)).await;

        Ok(home)
    }

    /// Deletes the home; rooms and devices cascade in the store. Room ids
    /// are fetched up front so each room's direct-lookup cache entry can be
    /// evicted along with the list caches and the power aggregate.
    pub async fn delete_home(&self, user_id: Uuid, home_id: Uuid) -> Result<(), ApiError> {
        let room_ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT r.id FROM rooms r \
             JOIN homes h ON h.id = r.home_id \
             WHERE r.home_id = $1 AND h.user_id = $2",
        )
        .bind(home_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let result = sqlx::query("DELETE FROM homes WHERE id = $1 AND user_id = $2")
            .bind(home_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Home not found".to_owned()));
        }

        info!(home_id = %home_id, user_id = %user_id, "home deleted");
        for key in cascade_eviction_keys(user_id, home_id, &room_ids) {
            self.cache.evict(&key).await;
        }

        Ok(())
    }
}

/// Every key a home deletion invalidates: the home itself, the owner's list
/// caches, the home-scoped child lists, the power aggregate, and each child
/// room's direct lookup.
fn cascade_eviction_keys(user_id: Uuid, home_id: Uuid, room_ids: &[Uuid]) -> Vec<CacheKey> {
    let mut evict = vec![
        keys::home(home_id, user_id),
        keys::user_homes(user_id),
        keys::home_rooms(home_id, user_id),
        keys::user_rooms(user_id),
        keys::home_devices(home_id, user_id),
        keys::user_devices(user_id),
        keys::home_power(home_id),
    ];
    evict.extend(room_ids.iter().map(|&room_id| keys::room(room_id, user_id)));
    evict
}

fn validate_home(req: &HomeRequest) -> Result<(), ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("Home name cannot be empty".to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_home_name_rejected() {
        let req = HomeRequest {
            name: "   ".to_owned(),
            address: None,
            timezone: None,
        };
        assert!(matches!(
            validate_home(&req),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn named_home_accepted() {
        let req = HomeRequest {
            name: "Cottage".to_owned(),
            address: Some("1 Lake Rd".to_owned()),
            timezone: Some("Europe/Warsaw".to_owned()),
        };
        assert!(validate_home(&req).is_ok());
    }

    #[test]
    fn home_deletion_evicts_each_room_lookup() {
        let user_id = Uuid::new_v4();
        let home_id = Uuid::new_v4();
        let room_ids = [Uuid::new_v4(), Uuid::new_v4()];

        let evicted = cascade_eviction_keys(user_id, home_id, &room_ids);
        for room_id in room_ids {
            assert!(evicted.contains(&keys::room(room_id, user_id)));
        }
        assert!(evicted.contains(&keys::home(home_id, user_id)));
        assert!(evicted.contains(&keys::home_power(home_id)));
    }
}

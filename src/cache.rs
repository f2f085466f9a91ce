//! Fail-open cache-aside layer over Redis.
//!
//! Every operation swallows cache errors: a failed `get` is a miss, a failed
//! `put`/`evict` is a no-op. Correctness always rests on Postgres; the cache
//! is a pure read optimisation. The layer can also run fully disabled (no
//! `REDIS_URL` configured, or the initial connection failed), in which case
//! every lookup misses.
//!
//! Keys are namespaced as `smarthome:{namespace}:{key}` so unrelated entity
//! types never collide. Key construction is centralised in [`keys`]; services
//! never assemble key strings themselves, and invalidation is exact-key only.

use std::time::Duration;

use anyhow::Result;
use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

/// A namespaced cache key. Built by the functions in [`keys`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    pub namespace: &'static str,
    pub key: String,
}

impl CacheKey {
    pub fn new(namespace: &'static str, key: impl Into<String>) -> Self {
        Self {
            namespace,
            key: key.into(),
        }
    }

    /// Full Redis key, `smarthome:{namespace}:{key}`.
    pub fn full(&self) -> String {
        format!("smarthome:{}:{}", self.namespace, self.key)
    }
}

#[derive(Clone)]
pub struct Cache {
    conn: Option<ConnectionManager>,
}

impl Cache {
    /// Connect to Redis. The returned handle is cheap to clone; the manager
    /// reconnects on its own after transient failures.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn: Some(conn) })
    }

    /// A cache that never hits and ignores writes. Used when no Redis is
    /// configured and in tests that only exercise the store path.
    pub fn disabled() -> Self {
        Self { conn: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.conn.is_some()
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let mut conn = self.conn.clone()?;
        let full = key.full();
        let raw: Option<String> = match conn.get(&full).await {
            Ok(v) => v,
            Err(e) => {
                warn!(key = %full, error = %e, "cache get failed, treating as miss");
                return None;
            }
        };
        let raw = match raw {
            Some(raw) => raw,
            None => {
                debug!(key = %full, "cache miss");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(key = %full, "cache hit");
                Some(value)
            }
            Err(e) => {
                // Undecodable entries are stale garbage; drop them.
                warn!(key = %full, error = %e, "cached value failed to decode, evicting");
                let _: Result<(), _> = conn.del(&full).await;
                None
            }
        }
    }

    pub async fn put<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: Duration) {
        let Some(mut conn) = self.conn.clone() else {
            return;
        };
        let full = key.full();
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %full, error = %e, "failed to serialise cache value");
                return;
            }
        };
        let ttl_secs = ttl.as_secs().max(1);
        if let Err(e) = conn.set_ex::<_, _, ()>(&full, raw, ttl_secs).await {
            warn!(key = %full, error = %e, "cache put failed");
        } else {
            debug!(key = %full, ttl_secs, "cached");
        }
    }

    pub async fn evict(&self, key: &CacheKey) {
        let Some(mut conn) = self.conn.clone() else {
            return;
        };
        let full = key.full();
        if let Err(e) = conn.del::<_, ()>(&full).await {
            warn!(key = %full, error = %e, "cache evict failed");
        } else {
            debug!(key = %full, "evicted");
        }
    }

    /// Evict every key in `namespace` starting with `prefix`. SCAN-based, so
    /// keys written concurrently with the scan may survive; prefer exact-key
    /// eviction where the stale set is enumerable.
    pub async fn evict_by_prefix(&self, namespace: &'static str, prefix: &str) {
        let Some(mut conn) = self.conn.clone() else {
            return;
        };
        let pattern = format!("{}*", CacheKey::new(namespace, prefix).full());
        let keys: Vec<String> = {
            let mut iter = match conn.scan_match::<_, String>(&pattern).await {
                Ok(iter) => iter,
                Err(e) => {
                    warn!(pattern = %pattern, error = %e, "cache scan failed");
                    return;
                }
            };
            let mut keys = Vec::new();
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
            keys
        };
        if keys.is_empty() {
            return;
        }
        if let Err(e) = conn.del::<_, ()>(&keys).await {
            warn!(pattern = %pattern, error = %e, "cache prefix evict failed");
        } else {
            debug!(pattern = %pattern, count = keys.len(), "evicted by prefix");
        }
    }
}

/// Key builders, one per cached lookup. Keeping them in one place makes the
/// invalidation sets in the services auditable against the read paths.
pub mod keys {
    use super::CacheKey;
    use super::Uuid;

    pub fn user(user_id: Uuid) -> CacheKey {
        CacheKey::new("user", user_id.to_string())
    }

    pub fn all_users() -> CacheKey {
        CacheKey::new("users", "all")
    }

    pub fn user_homes(user_id: Uuid) -> CacheKey {
        CacheKey::new("homes", format!("userHomes:{user_id}"))
    }

    pub fn home(home_id: Uuid, user_id: Uuid) -> CacheKey {
        CacheKey::new("homes", format!("home:{home_id}:user:{user_id}"))
    }

    pub fn user_rooms(user_id: Uuid) -> CacheKey {
        CacheKey::new("rooms", format!("userRooms:{user_id}"))
    }

    pub fn home_rooms(home_id: Uuid, user_id: Uuid) -> CacheKey {
        CacheKey::new("rooms", format!("homeRooms:{home_id}:user:{user_id}"))
    }

    pub fn room(room_id: Uuid, user_id: Uuid) -> CacheKey {
        CacheKey::new("rooms", format!("room:{room_id}:user:{user_id}"))
    }

    pub fn user_devices(user_id: Uuid) -> CacheKey {
        CacheKey::new("devices_user", user_id.to_string())
    }

    pub fn home_devices(home_id: Uuid, user_id: Uuid) -> CacheKey {
        CacheKey::new("devices_home", format!("{home_id}:user:{user_id}"))
    }

    pub fn home_power(home_id: Uuid) -> CacheKey {
        CacheKey::new("power_consumption", home_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_key_is_namespaced() {
        let key = CacheKey::new("homes", "userHomes:abc");
        assert_eq!(key.full(), "smarthome:homes:userHomes:abc");
    }

    #[test]
    fn key_builders_do_not_collide_across_entities() {
        let id = Uuid::new_v4();
        let built = [
            keys::user(id),
            keys::user_devices(id),
            keys::home_devices(id, id),
            keys::home_power(id),
            keys::user_homes(id),
            keys::user_rooms(id),
        ];
        for (i, a) in built.iter().enumerate() {
            for b in built.iter().skip(i + 1) {
                assert_ne!(a.full(), b.full());
            }
        }
    }

    #[test]
    fn home_and_room_keys_scope_by_user() {
        let entity = Uuid::new_v4();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        assert_ne!(keys::home(entity, alice).full(), keys::home(entity, bob).full());
        assert_ne!(keys::room(entity, alice).full(), keys::room(entity, bob).full());
    }

    #[tokio::test]
    async fn disabled_cache_misses_and_swallows_writes() {
        let cache = Cache::disabled();
        assert!(!cache.is_enabled());

        let key = keys::all_users();
        cache.put(&key, &vec!["a".to_owned()], Duration::from_secs(60)).await;
        let got: Option<Vec<String>> = cache.get(&key).await;
        assert!(got.is_none());

        // evictions are no-ops rather than errors
        cache.evict(&key).await;
        cache.evict_by_prefix("users", "").await;
    }
}

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod devices;
pub mod homes;
pub mod rooms;
pub mod users;

use sqlx::PgPool;

use auth::jwt::JwtKeys;
use auth::AuthService;
use cache::Cache;
use devices::DeviceService;
use homes::HomeService;
use rooms::RoomService;
use users::UserService;

/// Shared handler state. Every field is cheap to clone (pool handles,
/// connection managers, key bytes).
#[derive(Clone)]
pub struct AppState {
    pub jwt: JwtKeys,
    pub auth: AuthService,
    pub users: UserService,
    pub homes: HomeService,
    pub rooms: RoomService,
    pub devices: DeviceService,
    /// Marks the refresh cookie `Secure` (prod only).
    pub cookie_secure: bool,
}

impl AppState {
    pub fn new(pool: PgPool, cache: Cache, jwt: JwtKeys, cookie_secure: bool) -> Self {
        Self {
            auth: AuthService::new(pool.clone(), cache.clone(), jwt.clone()),
            users: UserService::new(pool.clone(), cache.clone()),
            homes: HomeService::new(pool.clone(), cache.clone()),
            rooms: RoomService::new(pool.clone(), cache.clone()),
            devices: DeviceService::new(pool, cache),
            jwt,
            cookie_secure,
        }
    }
}

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Redis connection URL. When absent the cache layer runs disabled and
    /// every lookup is a miss; the store remains the source of truth.
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
    /// Access-token lifetime in seconds.
    pub access_token_ttl_secs: u64,
    /// Refresh-token lifetime in seconds.
    pub refresh_token_ttl_secs: u64,
    /// `prod` marks the refresh cookie `Secure`.
    pub app_env: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            redis_url: std::env::var("REDIS_URL").ok().filter(|s| !s.is_empty()),
            jwt_secret: required("JWT_SECRET")?,
            server_host: optional("SERVER_HOST", "0.0.0.0"),
            server_port: optional("SERVER_PORT", "8080")
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            access_token_ttl_secs: optional("ACCESS_TOKEN_TTL_SECS", "3600")
                .parse()
                .context("ACCESS_TOKEN_TTL_SECS must be a positive integer")?,
            refresh_token_ttl_secs: optional("REFRESH_TOKEN_TTL_SECS", "604800")
                .parse()
                .context("REFRESH_TOKEN_TTL_SECS must be a positive integer")?,
            app_env: optional("APP_ENV", "dev"),
        })
    }

    pub fn is_prod(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("prod")
    }
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("missing required env var: {key}"))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

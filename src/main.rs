use anyhow::Result;
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use smart_home_api::{
    api,
    auth::jwt::JwtKeys,
    cache::Cache,
    config::Config,
    db, AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env (ignore error if file absent — env vars may be set externally)
    let _ = dotenvy::dotenv();

    // Initialise tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    // Load config
    let config = Config::from_env()?;

    // Connect to DB and run migrations
    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!("Database ready");

    // Connect to Redis. The cache layer is fail-open, so a missing or
    // unreachable Redis only costs the read-through shortcut.
    let cache = match &config.redis_url {
        Some(url) => match Cache::connect(url).await {
            Ok(cache) => {
                info!("Redis cache connected");
                cache
            }
            Err(e) => {
                warn!(error = %e, "Redis unavailable, running without cache");
                Cache::disabled()
            }
        },
        None => {
            info!("REDIS_URL not set, running without cache");
            Cache::disabled()
        }
    };

    let jwt = JwtKeys::new(
        &config.jwt_secret,
        config.access_token_ttl_secs,
        config.refresh_token_ttl_secs,
    );
    let state = AppState::new(pool, cache, jwt, config.is_prod());

    // Start HTTP server
    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

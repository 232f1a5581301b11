use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use presence_relay::adapters::credentials::PostgresCredentialStore;
use presence_relay::adapters::http::{app_router, AppState};
use presence_relay::adapters::oauth::DiscordOAuthProvider;
use presence_relay::adapters::rate_limiter::{InMemoryRateLimiter, RedisRateLimiter};
use presence_relay::adapters::websocket::RoomManager;
use presence_relay::config::AppConfig;
use presence_relay::ports::RateLimiter;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    // Load configuration first; the log filter comes from it
    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&config);

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(config).await {
        error!("Relay stopped: {}", e);
        std::process::exit(1);
    }
}

/// JSON logs in production, human-readable otherwise. `RUST_LOG` wins over
/// the configured level.
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("Starting Presence Relay v{}", env!("CARGO_PKG_VERSION"));

    // Credential store
    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;
    let credentials = PostgresCredentialStore::new(pool);
    if config.database.run_migrations {
        credentials.migrate().await?;
        info!("Database migrations applied");
    }

    // Rate limiter
    let rate_limit = config.relay.rate_limit();
    let rate_limiter: Arc<dyn RateLimiter> = match &config.redis {
        Some(redis) => {
            info!("Rate limiter: Redis");
            Arc::new(RedisRateLimiter::connect(&redis.url, rate_limit).await?)
        }
        None => {
            info!("Rate limiter: in-memory (Redis not configured)");
            Arc::new(InMemoryRateLimiter::new(rate_limit))
        }
    };

    let oauth = DiscordOAuthProvider::new(config.oauth.clone())?;

    let state = AppState {
        credentials: Arc::new(credentials),
        registry: Arc::new(RoomManager::new()),
        rate_limiter,
        oauth: Arc::new(oauth),
        connection_buffer: config.relay.connection_buffer,
        trust_proxy_headers: config.server.trust_proxy_headers,
    };
    let app = app_router(state);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Relay listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Relay shut down");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}

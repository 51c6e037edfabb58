//! Server setup and initialization
//!
//! Provides the application builder and server runner.

use std::sync::Arc;

use axum::Router;
use peiplay_cache::{create_shared_pool, RedisPoolConfig};
use peiplay_common::{AppConfig, AppError, JwtService};
use peiplay_core::SnowflakeGenerator;
use peiplay_db::{create_pool, run_migrations, DbResilience};
use peiplay_service::{services::spawn_scheduler, ServiceContextBuilder};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::middleware::apply_middleware_with_config;
use crate::routes::{create_router, health_routes};
use crate::state::AppState;

const MAX_WORKER_ID: u16 = 1024;

/// Build the complete Axum application with all routes and middleware
///
/// Health probes are merged after the middleware so they bypass rate limiting.
pub fn create_app(state: AppState) -> Router {
    let config = state.config();
    let api = apply_middleware_with_config(
        create_router(),
        &config.rate_limit,
        &config.cors,
        config.app.env.is_production(),
    );

    api.merge(health_routes()).with_state(state)
}

/// Initialize all dependencies and create AppState
pub async fn create_app_state(config: AppConfig) -> Result<AppState, AppError> {
    info!("Connecting to PostgreSQL...");
    let pool = create_pool(&config.database)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    if config.database.run_migrations {
        run_migrations(&pool, &config.database.migrations_dir)
            .await
            .map_err(|e| AppError::Database(format!("migrations failed: {e}")))?;
    }

    info!("Connecting to Redis...");
    let redis_pool = create_shared_pool(RedisPoolConfig::from(&config.redis))
        .map_err(|e| AppError::Cache(e.to_string()))?;

    let jwt_service = Arc::new(JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expiry,
        config.jwt.refresh_token_expiry,
    ));

    let worker_id = config.snowflake.worker_id;
    if worker_id >= MAX_WORKER_ID {
        return Err(AppError::Config(format!(
            "WORKER_ID must be below {MAX_WORKER_ID}, got {worker_id}"
        )));
    }
    let snowflake_generator = Arc::new(SnowflakeGenerator::new(worker_id));

    let resilience = Arc::new(DbResilience::new(&config.resilience));

    let service_context = ServiceContextBuilder::new()
        .pool(pool)
        .redis_pool(redis_pool)
        .resilience(resilience)
        .jwt_service(jwt_service)
        .snowflake_generator(snowflake_generator)
        .platform(config.platform.clone())
        .cron(config.cron.clone())
        .environment(config.app.env)
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?;

    Ok(AppState::new(Arc::new(service_context), config))
}

/// Run the HTTP server until SIGINT or SIGTERM
pub async fn run_server(app: Router, addr: &str) -> Result<(), AppError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))?;

    info!("Server shutdown complete");
    Ok(())
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = config.api.address();
    let scheduler_enabled = config.cron.scheduler_enabled;

    let state = create_app_state(config).await?;

    let scheduler = scheduler_enabled.then(|| spawn_scheduler(state.shared_context()));

    let result = run_server(create_app(state), &addr).await;

    if let Some(handle) = scheduler {
        handle.abort();
    }
    result
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}

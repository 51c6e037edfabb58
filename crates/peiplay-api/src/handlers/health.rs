//! Health check handlers
//!
//! Liveness and readiness probes, mounted outside `/api/v1`.

use axum::{extract::State, http::StatusCode, Json};
use peiplay_db::BreakerState;
use peiplay_service::dto::{HealthChecks, HealthResponse, ReadinessResponse};

use crate::state::AppState;

const UP: &str = "up";
const DOWN: &str = "down";

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Database, Redis and circuit breaker; 503 unless all are usable
///
/// GET /health/ready
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let ctx = state.service_context();

    let db_healthy = db_ping(ctx.pool()).await;
    let redis_healthy = ctx.redis_pool().health_check().await.is_ok();
    let breaker = ctx.resilience().breaker_state();

    let ready = db_healthy && redis_healthy && breaker != BreakerState::Open;
    let response = ReadinessResponse {
        status: if ready { "ready" } else { "degraded" },
        checks: HealthChecks {
            database: if db_healthy { UP } else { DOWN },
            redis: if redis_healthy { UP } else { DOWN },
            circuit_breaker: breaker.as_str(),
        },
    };

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

async fn db_ping(pool: &peiplay_db::PgPool) -> bool {
    pool.acquire().await.is_ok()
}

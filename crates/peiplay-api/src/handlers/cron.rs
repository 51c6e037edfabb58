//! Sweep triggers for an external scheduler

use axum::{extract::State, Json};
use peiplay_service::dto::{AutoCloseResponse, CompleteBookingsResponse, ReferralSweepResponse};
use peiplay_service::services::CronService;

use crate::extractors::CronAuth;
use crate::response::ApiResult;
use crate::state::AppState;

/// /cron/auto-close-available
pub async fn auto_close_available(
    _: CronAuth,
    State(state): State<AppState>,
) -> ApiResult<Json<AutoCloseResponse>> {
    let response = CronService::new(state.service_context())
        .auto_close_available()
        .await?;
    Ok(Json(response))
}

/// /cron/complete-bookings
pub async fn complete_bookings(
    _: CronAuth,
    State(state): State<AppState>,
) -> ApiResult<Json<CompleteBookingsResponse>> {
    let response = CronService::new(state.service_context())
        .complete_bookings()
        .await?;
    Ok(Json(response))
}

/// /cron/calculate-referral-earnings
pub async fn calculate_referral_earnings(
    _: CronAuth,
    State(state): State<AppState>,
) -> ApiResult<Json<ReferralSweepResponse>> {
    let response = CronService::new(state.service_context())
        .calculate_referral_earnings()
        .await?;
    Ok(Json(response))
}

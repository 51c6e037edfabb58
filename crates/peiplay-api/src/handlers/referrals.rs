//! Referral handlers

use axum::{extract::State, Json};
use peiplay_service::dto::{
    ReferralCodeRequest, ReferralCodeResponse, ReferralStatsResponse, ReferralValidationResponse,
};
use peiplay_service::services::ReferralService;

use crate::extractors::{AuthUser, QueryParams, ValidatedJson};
use crate::response::ApiResult;
use crate::state::AppState;

/// POST /partners/referral/generate-code
pub async fn generate_code(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ReferralCodeResponse>> {
    let response = ReferralService::new(state.service_context())
        .generate_code(auth.user_id)
        .await?;
    Ok(Json(response))
}

/// GET /partners/referral/validate-code?code=
pub async fn validate_code(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ReferralCodeRequest>,
) -> ApiResult<Json<ReferralValidationResponse>> {
    let response = ReferralService::new(state.service_context())
        .validate_code(&query.code)
        .await?;
    Ok(Json(response))
}

/// POST /partners/referral/apply
pub async fn apply_code(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<ReferralCodeRequest>,
) -> ApiResult<Json<ReferralValidationResponse>> {
    let response = ReferralService::new(state.service_context())
        .apply_code(auth.user_id, request)
        .await?;
    Ok(Json(response))
}

/// GET /partners/referral/stats
pub async fn stats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ReferralStatsResponse>> {
    let response = ReferralService::new(state.service_context())
        .stats(auth.user_id)
        .await?;
    Ok(Json(response))
}

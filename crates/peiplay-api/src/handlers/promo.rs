//! Promo code validation

use axum::{extract::State, Json};
use peiplay_service::dto::{PromoValidationResponse, ValidatePromoRequest};
use peiplay_service::services::PromoService;

use crate::extractors::ValidatedJson;
use crate::response::ApiResult;
use crate::state::AppState;

/// POST /promo-codes/validate
pub async fn validate(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ValidatePromoRequest>,
) -> ApiResult<Json<PromoValidationResponse>> {
    let response = PromoService::new(state.service_context())
        .validate(request)
        .await?;
    Ok(Json(response))
}

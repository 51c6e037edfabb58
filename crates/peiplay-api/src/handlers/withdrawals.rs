//! Partner withdrawal handlers

use axum::{extract::State, Json};
use peiplay_service::dto::{
    CreateWithdrawalRequest, WithdrawalCreatedResponse, WithdrawalHistoryResponse,
};
use peiplay_service::services::WithdrawalService;

use crate::extractors::{AuthUser, ValidatedJson};
use crate::response::{ApiResult, Created};
use crate::state::AppState;

/// POST /partners/withdrawal/request
pub async fn request(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateWithdrawalRequest>,
) -> ApiResult<Created<Json<WithdrawalCreatedResponse>>> {
    let response = WithdrawalService::new(state.service_context())
        .request(auth.user_id, request)
        .await?;
    Ok(Created(Json(response)))
}

/// GET /partners/withdrawal/history
pub async fn history(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<WithdrawalHistoryResponse>> {
    let response = WithdrawalService::new(state.service_context())
        .history(auth.user_id)
        .await?;
    Ok(Json(response))
}

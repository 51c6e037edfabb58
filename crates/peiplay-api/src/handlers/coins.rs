//! Coin wallet handlers

use axum::{extract::State, Json};
use peiplay_service::dto::{
    CoinBalanceResponse, CoinTransactionResponse, PaginatedResponse, RechargeRequest,
    RechargeResponse,
};
use peiplay_service::services::CoinService;

use crate::extractors::{AuthUser, Pagination, ValidatedJson};
use crate::response::{ApiResult, Created};
use crate::state::AppState;

/// GET /coins
pub async fn balance(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<CoinBalanceResponse>> {
    let response = CoinService::new(state.service_context())
        .balance(auth.user_id)
        .await?;
    Ok(Json(response))
}

/// GET /coins/transactions
pub async fn transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Pagination(page): Pagination,
) -> ApiResult<Json<PaginatedResponse<CoinTransactionResponse>>> {
    let response = CoinService::new(state.service_context())
        .transactions(auth.user_id, page)
        .await?;
    Ok(Json(response))
}

/// Opens a pending recharge; coins are credited by the payment callback
///
/// POST /coins/recharge
pub async fn recharge(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<RechargeRequest>,
) -> ApiResult<Created<Json<RechargeResponse>>> {
    let response = CoinService::new(state.service_context())
        .recharge(auth.user_id, request)
        .await?;
    Ok(Created(Json(response)))
}

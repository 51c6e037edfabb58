//! Payment handlers
//!
//! Order creation for customers and the gateway's server-to-server callback.

use axum::{
    extract::{rejection::FormRejection, State},
    Form, Json,
};
use peiplay_service::dto::{CreateOrderRequest, OrderResponse, PaymentCallbackRequest};
use peiplay_service::services::PaymentService;

use crate::extractors::{AuthUser, ValidatedJson};
use crate::response::{ApiError, ApiResult};
use crate::state::AppState;

/// POST /payment/create
pub async fn create_order(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateOrderRequest>,
) -> ApiResult<Json<OrderResponse>> {
    let response = PaymentService::new(state.service_context())
        .create_order(auth.user_id, request)
        .await?;
    Ok(Json(response))
}

/// Gateway notification; the gateway expects the literal `1|OK`
///
/// POST /payment/callback
pub async fn callback(
    State(state): State<AppState>,
    form: Result<Form<PaymentCallbackRequest>, FormRejection>,
) -> ApiResult<&'static str> {
    let Form(request) = form.map_err(|e| ApiError::invalid_body(e.body_text()))?;

    let raw_payload = serde_json::json!({
        "MerchantTradeNo": request.merchant_trade_no,
        "RtnCode": request.rtn_code,
        "TradeNo": request.trade_no,
        "TradeAmt": request.trade_amt,
    });

    let ack = PaymentService::new(state.service_context())
        .callback(request, raw_payload)
        .await?;
    Ok(ack)
}

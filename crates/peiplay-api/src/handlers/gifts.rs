//! Gift handlers

use axum::{extract::State, Json};
use peiplay_service::dto::{
    GiftItemResponse, ReceivedGiftsResponse, SendGiftRequest, SendGiftResponse,
};
use peiplay_service::services::GiftService;

use crate::extractors::{AuthUser, ValidatedJson};
use crate::response::ApiResult;
use crate::state::AppState;

/// GET /gifts
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<GiftItemResponse>>> {
    let response = GiftService::new(state.service_context()).list().await?;
    Ok(Json(response))
}

/// POST /gifts/send
pub async fn send(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<SendGiftRequest>,
) -> ApiResult<Json<SendGiftResponse>> {
    let response = GiftService::new(state.service_context())
        .send(auth.user_id, request)
        .await?;
    Ok(Json(response))
}

/// GET /gifts/received
pub async fn received(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ReceivedGiftsResponse>> {
    let response = GiftService::new(state.service_context())
        .received(auth.user_id)
        .await?;
    Ok(Json(response))
}

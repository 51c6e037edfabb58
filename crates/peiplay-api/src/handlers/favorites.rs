//! Favourite partners of the calling customer

use axum::{extract::State, Json};
use peiplay_service::dto::PartnerResponse;
use peiplay_service::services::FavoriteService;

use crate::extractors::{AuthUser, IdPath};
use crate::response::{ApiResult, NoContent};
use crate::state::AppState;

/// GET /favorites
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<PartnerResponse>>> {
    let response = FavoriteService::new(state.service_context())
        .list(auth.user_id)
        .await?;
    Ok(Json(response))
}

/// PUT /favorites/{partner_id}
pub async fn add(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(partner_id): IdPath,
) -> ApiResult<NoContent> {
    FavoriteService::new(state.service_context())
        .add(auth.user_id, partner_id)
        .await?;
    Ok(NoContent)
}

/// DELETE /favorites/{partner_id}
pub async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(partner_id): IdPath,
) -> ApiResult<NoContent> {
    FavoriteService::new(state.service_context())
        .remove(auth.user_id, partner_id)
        .await?;
    Ok(NoContent)
}

//! Public announcements

use axum::{extract::State, Json};
use peiplay_service::dto::AnnouncementResponse;
use peiplay_service::services::AnnouncementService;

use crate::response::ApiResult;
use crate::state::AppState;

/// GET /announcements
pub async fn list_active(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<AnnouncementResponse>>> {
    let response = AnnouncementService::new(state.service_context())
        .list_active()
        .await?;
    Ok(Json(response))
}

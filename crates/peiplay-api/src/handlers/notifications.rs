//! Notification handlers for the calling user

use axum::{extract::State, Json};
use peiplay_service::dto::NotificationListResponse;
use peiplay_service::services::NotificationService;
use serde::Serialize;

use crate::extractors::{AuthUser, IdPath, Pagination};
use crate::response::{ApiResult, NoContent};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

/// GET /notifications
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Pagination(page): Pagination,
) -> ApiResult<Json<NotificationListResponse>> {
    let response = NotificationService::new(state.service_context())
        .list(auth.user_id, page)
        .await?;
    Ok(Json(response))
}

/// POST /notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<MarkAllReadResponse>> {
    let updated = NotificationService::new(state.service_context())
        .mark_all_read(auth.user_id)
        .await?;
    Ok(Json(MarkAllReadResponse { updated }))
}

/// POST /notifications/{notification_id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath,
) -> ApiResult<NoContent> {
    NotificationService::new(state.service_context())
        .mark_read(id, auth.user_id)
        .await?;
    Ok(NoContent)
}

/// Soft delete
///
/// DELETE /notifications/{notification_id}
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath,
) -> ApiResult<NoContent> {
    NotificationService::new(state.service_context())
        .delete(id, auth.user_id)
        .await?;
    Ok(NoContent)
}

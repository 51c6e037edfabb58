//! Schedule handlers for the calling partner

use axum::{extract::State, Json};
use peiplay_service::dto::{
    BatchScheduleRequest, BatchScheduleResponse, CreateScheduleRequest, ScheduleResponse,
    TimeWindowQuery,
};
use peiplay_service::services::ScheduleService;

use crate::extractors::{AuthUser, IdPath, QueryParams, ValidatedJson};
use crate::response::{ApiResult, Created, NoContent};
use crate::state::AppState;

/// GET /schedules
pub async fn list_mine(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(window): QueryParams<TimeWindowQuery>,
) -> ApiResult<Json<Vec<ScheduleResponse>>> {
    let response = ScheduleService::new(state.service_context())
        .list_mine(auth.user_id, window)
        .await?;
    Ok(Json(response))
}

/// One slot, or weekly copies of it when recurring
///
/// POST /schedules
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateScheduleRequest>,
) -> ApiResult<Created<Json<Vec<ScheduleResponse>>>> {
    let response = ScheduleService::new(state.service_context())
        .create(auth.user_id, request)
        .await?;
    Ok(Created(Json(response)))
}

/// POST /schedules/batch
pub async fn create_batch(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<BatchScheduleRequest>,
) -> ApiResult<Created<Json<BatchScheduleResponse>>> {
    let response = ScheduleService::new(state.service_context())
        .create_batch(auth.user_id, request)
        .await?;
    Ok(Created(Json(response)))
}

/// DELETE /schedules/{schedule_id}
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(schedule_id): IdPath,
) -> ApiResult<NoContent> {
    ScheduleService::new(state.service_context())
        .delete(auth.user_id, schedule_id)
        .await?;
    Ok(NoContent)
}

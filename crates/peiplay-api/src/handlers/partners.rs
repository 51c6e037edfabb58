//! Partner handlers
//!
//! Public browsing plus the caller's own partner profile.

use axum::{extract::State, Json};
use peiplay_core::entities::BusyStatus;
use peiplay_service::dto::{
    ApplyPartnerRequest, OwnPartnerResponse, PartnerDetailResponse, PartnerListQuery,
    PartnerResponse, RatingResponse, ScheduleResponse, SetAvailabilityRequest, TimeWindowQuery,
    UpdatePartnerRequest,
};
use peiplay_service::services::{PartnerService, ReviewService};

use crate::extractors::{AuthUser, IdPath, Pagination, QueryParams, ValidatedJson};
use crate::response::{ApiResult, Created};
use crate::state::AppState;

/// Approved partners, optionally filtered by game or "available now"
///
/// GET /partners
pub async fn list_partners(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<PartnerListQuery>,
    Pagination(page): Pagination,
) -> ApiResult<Json<Vec<PartnerResponse>>> {
    let response = PartnerService::new(state.service_context())
        .list(query, page)
        .await?;
    Ok(Json(response))
}

/// POST /partners/apply
pub async fn apply(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<ApplyPartnerRequest>,
) -> ApiResult<Created<Json<OwnPartnerResponse>>> {
    let response = PartnerService::new(state.service_context())
        .apply(auth.user_id, request)
        .await?;
    Ok(Created(Json(response)))
}

/// GET /partners/self
pub async fn get_self(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<OwnPartnerResponse>> {
    let response = PartnerService::new(state.service_context())
        .get_self(auth.user_id)
        .await?;
    Ok(Json(response))
}

/// PATCH /partners/self
pub async fn update_self(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<UpdatePartnerRequest>,
) -> ApiResult<Json<OwnPartnerResponse>> {
    let response = PartnerService::new(state.service_context())
        .update_self(auth.user_id, request)
        .await?;
    Ok(Json(response))
}

/// PUT /partners/self/availability
pub async fn set_availability(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<SetAvailabilityRequest>,
) -> ApiResult<Json<OwnPartnerResponse>> {
    let response = PartnerService::new(state.service_context())
        .set_availability(auth.user_id, request)
        .await?;
    Ok(Json(response))
}

/// GET /partners/{partner_id}
pub async fn get_partner(
    State(state): State<AppState>,
    IdPath(partner_id): IdPath,
) -> ApiResult<Json<PartnerDetailResponse>> {
    let response = PartnerService::new(state.service_context())
        .get(partner_id)
        .await?;
    Ok(Json(response))
}

/// Bookable slots in an optional window
///
/// GET /partners/{partner_id}/schedules
pub async fn get_schedules(
    State(state): State<AppState>,
    IdPath(partner_id): IdPath,
    QueryParams(window): QueryParams<TimeWindowQuery>,
) -> ApiResult<Json<Vec<ScheduleResponse>>> {
    let response = PartnerService::new(state.service_context())
        .schedules(partner_id, window)
        .await?;
    Ok(Json(response))
}

/// GET /partners/{partner_id}/busy
pub async fn busy_status(
    State(state): State<AppState>,
    IdPath(partner_id): IdPath,
) -> ApiResult<Json<BusyStatus>> {
    let response = PartnerService::new(state.service_context())
        .busy_status(partner_id)
        .await?;
    Ok(Json(response))
}

/// GET /partners/{partner_id}/rating
pub async fn average_rating(
    State(state): State<AppState>,
    IdPath(partner_id): IdPath,
) -> ApiResult<Json<RatingResponse>> {
    let response = ReviewService::new(state.service_context())
        .average_rating(partner_id)
        .await?;
    Ok(Json(response))
}

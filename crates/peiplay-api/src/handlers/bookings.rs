//! Booking handlers
//!
//! Customers create and cancel; partners respond and accept.

use axum::{extract::State, Json};
use peiplay_service::dto::{
    BookingDetailResponse, BookingListQuery, CancelBookingRequest, CancelBookingResponse,
    CreateBookingRequest, InstantBookingRequest, PaginatedResponse, RespondBookingRequest,
};
use peiplay_service::services::BookingService;

use crate::extractors::{AuthUser, IdPath, OptionalValidatedJson, Pagination, QueryParams, ValidatedJson};
use crate::response::{ApiResult, Created};
use crate::state::AppState;

/// The caller's bookings as customer (default) or as partner
///
/// GET /bookings
pub async fn list_mine(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<BookingListQuery>,
    Pagination(page): Pagination,
) -> ApiResult<Json<PaginatedResponse<BookingDetailResponse>>> {
    let response = BookingService::new(state.service_context())
        .list_mine(auth.user_id, query, page)
        .await?;
    Ok(Json(response))
}

/// Book one or more schedules in a single transaction
///
/// POST /bookings
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateBookingRequest>,
) -> ApiResult<Created<Json<Vec<BookingDetailResponse>>>> {
    let response = BookingService::new(state.service_context())
        .create(auth.user_id, request)
        .await?;
    Ok(Created(Json(response)))
}

/// POST /bookings/instant
pub async fn instant(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<InstantBookingRequest>,
) -> ApiResult<Created<Json<BookingDetailResponse>>> {
    let response = BookingService::new(state.service_context())
        .instant(auth.user_id, request)
        .await?;
    Ok(Created(Json(response)))
}

/// GET /bookings/{booking_id}
pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(booking_id): IdPath,
) -> ApiResult<Json<BookingDetailResponse>> {
    let response = BookingService::new(state.service_context())
        .get(auth.user_id, booking_id)
        .await?;
    Ok(Json(response))
}

/// Cancelling twice returns the cancelled booking again
///
/// POST /bookings/{booking_id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(booking_id): IdPath,
    OptionalValidatedJson(request): OptionalValidatedJson<CancelBookingRequest>,
) -> ApiResult<Json<CancelBookingResponse>> {
    let response = BookingService::new(state.service_context())
        .cancel(auth.user_id, booking_id, request)
        .await?;
    Ok(Json(response))
}

/// POST /bookings/{booking_id}/respond
pub async fn respond(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(booking_id): IdPath,
    ValidatedJson(request): ValidatedJson<RespondBookingRequest>,
) -> ApiResult<Json<BookingDetailResponse>> {
    let response = BookingService::new(state.service_context())
        .respond(auth.user_id, booking_id, request)
        .await?;
    Ok(Json(response))
}

/// POST /bookings/{booking_id}/accept
pub async fn accept(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(booking_id): IdPath,
) -> ApiResult<Json<BookingDetailResponse>> {
    let response = BookingService::new(state.service_context())
        .accept(auth.user_id, booking_id)
        .await?;
    Ok(Json(response))
}

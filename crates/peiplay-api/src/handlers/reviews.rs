//! Review handlers

use axum::{extract::State, Json};
use peiplay_service::dto::{CreateReviewRequest, ReviewListQuery, ReviewResponse};
use peiplay_service::services::ReviewService;

use crate::extractors::{AuthUser, OptionalAuthUser, Pagination, QueryParams, ValidatedJson};
use crate::response::{ApiResult, Created};
use crate::state::AppState;

/// POST /reviews
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateReviewRequest>,
) -> ApiResult<Created<Json<ReviewResponse>>> {
    let response = ReviewService::new(state.service_context())
        .create(auth.user_id, request)
        .await?;
    Ok(Created(Json(response)))
}

/// Approved reviews for a user or booking; admins see all of them
///
/// GET /reviews?reviewee_id=|booking_id=
pub async fn list(
    State(state): State<AppState>,
    auth: OptionalAuthUser,
    QueryParams(query): QueryParams<ReviewListQuery>,
    Pagination(page): Pagination,
) -> ApiResult<Json<Vec<ReviewResponse>>> {
    let response = ReviewService::new(state.service_context())
        .list(auth.user_id(), query, page)
        .await?;
    Ok(Json(response))
}

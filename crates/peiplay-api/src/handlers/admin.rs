//! Admin handlers
//!
//! Every service call below re-checks the caller's ADMIN role in the database.

use axum::{extract::State, Json};
use peiplay_service::dto::{
    AdminAddCoinsRequest, AdminNotifyRequest, AdminPartnerQuery, AdminUserQuery,
    AnnouncementResponse, CoinTransactionResponse, CreateAnnouncementRequest, CreatePromoRequest,
    ModerateReviewRequest, OwnPartnerResponse, PaginatedResponse, ProcessWithdrawalRequest,
    PromoCodeResponse, ReviewPartnerRequest, ReviewResponse, SuspendUserRequest,
    UpdateAnnouncementRequest, UpdatePromoRequest, UserResponse, WithdrawalListQuery,
    WithdrawalResponse,
};
use peiplay_service::services::{
    AdminUserService, AnnouncementService, CoinService, NotificationService, PartnerService,
    PromoService, ReviewService, WithdrawalService,
};

use crate::extractors::{AuthUser, IdPath, Pagination, QueryParams, ValidatedJson};
use crate::response::{ApiResult, Created, NoContent};
use crate::state::AppState;

// ============================================================================
// Users
// ============================================================================

/// GET /admin/users
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<AdminUserQuery>,
    Pagination(page): Pagination,
) -> ApiResult<Json<PaginatedResponse<UserResponse>>> {
    let response = AdminUserService::new(state.service_context())
        .list(auth.user_id, query, page)
        .await?;
    Ok(Json(response))
}

/// POST /admin/users/{user_id}/suspend
pub async fn suspend_user(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(user_id): IdPath,
    ValidatedJson(request): ValidatedJson<SuspendUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    let response = AdminUserService::new(state.service_context())
        .suspend(auth.user_id, user_id, request)
        .await?;
    Ok(Json(response))
}

/// POST /admin/users/{user_id}/unsuspend
pub async fn unsuspend_user(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(user_id): IdPath,
) -> ApiResult<Json<UserResponse>> {
    let response = AdminUserService::new(state.service_context())
        .unsuspend(auth.user_id, user_id)
        .await?;
    Ok(Json(response))
}

/// POST /admin/users/{user_id}/verify
pub async fn verify_user(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(user_id): IdPath,
) -> ApiResult<Json<UserResponse>> {
    let response = AdminUserService::new(state.service_context())
        .verify(auth.user_id, user_id)
        .await?;
    Ok(Json(response))
}

/// DELETE /admin/users/{user_id}
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(user_id): IdPath,
) -> ApiResult<NoContent> {
    AdminUserService::new(state.service_context())
        .delete(auth.user_id, user_id)
        .await?;
    Ok(NoContent)
}

// ============================================================================
// Partners
// ============================================================================

/// GET /admin/partners
pub async fn list_partners(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<AdminPartnerQuery>,
    Pagination(page): Pagination,
) -> ApiResult<Json<Vec<OwnPartnerResponse>>> {
    let response = PartnerService::new(state.service_context())
        .admin_list(auth.user_id, query, page)
        .await?;
    Ok(Json(response))
}

/// Approve or reject an application
///
/// POST /admin/partners/{partner_id}/review
pub async fn review_partner(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(partner_id): IdPath,
    ValidatedJson(request): ValidatedJson<ReviewPartnerRequest>,
) -> ApiResult<Json<OwnPartnerResponse>> {
    let response = PartnerService::new(state.service_context())
        .admin_review(auth.user_id, partner_id, request)
        .await?;
    Ok(Json(response))
}

// ============================================================================
// Promo codes
// ============================================================================

/// GET /admin/promo-codes
pub async fn list_promo_codes(
    State(state): State<AppState>,
    auth: AuthUser,
    Pagination(page): Pagination,
) -> ApiResult<Json<Vec<PromoCodeResponse>>> {
    let response = PromoService::new(state.service_context())
        .admin_list(auth.user_id, page)
        .await?;
    Ok(Json(response))
}

/// POST /admin/promo-codes
pub async fn create_promo_code(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<CreatePromoRequest>,
) -> ApiResult<Created<Json<PromoCodeResponse>>> {
    let response = PromoService::new(state.service_context())
        .admin_create(auth.user_id, request)
        .await?;
    Ok(Created(Json(response)))
}

/// PATCH /admin/promo-codes/{promo_id}
pub async fn update_promo_code(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath,
    ValidatedJson(request): ValidatedJson<UpdatePromoRequest>,
) -> ApiResult<Json<PromoCodeResponse>> {
    let response = PromoService::new(state.service_context())
        .admin_update(auth.user_id, id, request)
        .await?;
    Ok(Json(response))
}

/// DELETE /admin/promo-codes/{promo_id}
pub async fn delete_promo_code(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath,
) -> ApiResult<NoContent> {
    PromoService::new(state.service_context())
        .admin_delete(auth.user_id, id)
        .await?;
    Ok(NoContent)
}

/// POST /admin/promo-codes/{promo_id}/toggle
pub async fn toggle_promo_code(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath,
) -> ApiResult<Json<PromoCodeResponse>> {
    let response = PromoService::new(state.service_context())
        .admin_toggle(auth.user_id, id)
        .await?;
    Ok(Json(response))
}

// ============================================================================
// Coins
// ============================================================================

/// POST /admin/coins/add
pub async fn add_coins(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<AdminAddCoinsRequest>,
) -> ApiResult<Json<CoinTransactionResponse>> {
    let response = CoinService::new(state.service_context())
        .admin_add(auth.user_id, request)
        .await?;
    Ok(Json(response))
}

// ============================================================================
// Withdrawals
// ============================================================================

/// GET /admin/withdrawals
pub async fn list_withdrawals(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<WithdrawalListQuery>,
    Pagination(page): Pagination,
) -> ApiResult<Json<Vec<WithdrawalResponse>>> {
    let response = WithdrawalService::new(state.service_context())
        .admin_list(auth.user_id, query, page)
        .await?;
    Ok(Json(response))
}

/// POST /admin/withdrawals/{withdrawal_id}/process
pub async fn process_withdrawal(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath,
    ValidatedJson(request): ValidatedJson<ProcessWithdrawalRequest>,
) -> ApiResult<Json<WithdrawalResponse>> {
    let response = WithdrawalService::new(state.service_context())
        .admin_process(auth.user_id, id, request)
        .await?;
    Ok(Json(response))
}

// ============================================================================
// Reviews
// ============================================================================

/// Reviews awaiting moderation
///
/// GET /admin/reviews
pub async fn pending_reviews(
    State(state): State<AppState>,
    auth: AuthUser,
    Pagination(page): Pagination,
) -> ApiResult<Json<Vec<ReviewResponse>>> {
    let response = ReviewService::new(state.service_context())
        .admin_pending(auth.user_id, page)
        .await?;
    Ok(Json(response))
}

/// POST /admin/reviews/{review_id}/moderate
pub async fn moderate_review(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath,
    ValidatedJson(request): ValidatedJson<ModerateReviewRequest>,
) -> ApiResult<NoContent> {
    ReviewService::new(state.service_context())
        .admin_moderate(auth.user_id, id, request)
        .await?;
    Ok(NoContent)
}

// ============================================================================
// Notifications & announcements
// ============================================================================

/// POST /admin/notifications
pub async fn send_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<AdminNotifyRequest>,
) -> ApiResult<NoContent> {
    NotificationService::new(state.service_context())
        .admin_send_personal(auth.user_id, request)
        .await?;
    Ok(NoContent)
}

/// GET /admin/announcements
pub async fn list_announcements(
    State(state): State<AppState>,
    auth: AuthUser,
    Pagination(page): Pagination,
) -> ApiResult<Json<Vec<AnnouncementResponse>>> {
    let response = AnnouncementService::new(state.service_context())
        .admin_list(auth.user_id, page)
        .await?;
    Ok(Json(response))
}

/// POST /admin/announcements
pub async fn create_announcement(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateAnnouncementRequest>,
) -> ApiResult<Created<Json<AnnouncementResponse>>> {
    let response = AnnouncementService::new(state.service_context())
        .create(auth.user_id, request)
        .await?;
    Ok(Created(Json(response)))
}

/// PATCH /admin/announcements/{announcement_id}
pub async fn update_announcement(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath,
    ValidatedJson(request): ValidatedJson<UpdateAnnouncementRequest>,
) -> ApiResult<Json<AnnouncementResponse>> {
    let response = AnnouncementService::new(state.service_context())
        .update(auth.user_id, id, request)
        .await?;
    Ok(Json(response))
}

/// POST /admin/announcements/{announcement_id}/deactivate
pub async fn deactivate_announcement(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath,
) -> ApiResult<Json<AnnouncementResponse>> {
    let response = AnnouncementService::new(state.service_context())
        .deactivate(auth.user_id, id)
        .await?;
    Ok(Json(response))
}

//! Authentication handlers
//!
//! Registration, login, token rotation, logout and password changes.

use axum::{extract::State, Json};
use peiplay_service::dto::{
    AuthResponse, ChangePasswordRequest, CurrentUserResponse, LoginRequest, LogoutRequest,
    RefreshTokenRequest, RegisterRequest,
};
use peiplay_service::services::AuthService;

use crate::extractors::{AuthUser, OptionalValidatedJson, ValidatedJson};
use crate::response::{ApiResult, Created, NoContent};
use crate::state::AppState;

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> ApiResult<Created<Json<AuthResponse>>> {
    let response = AuthService::new(state.service_context()).register(request).await?;
    Ok(Created(Json(response)))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let response = AuthService::new(state.service_context()).login(request).await?;
    Ok(Json(response))
}

/// Rotate the refresh token
///
/// POST /auth/refresh
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RefreshTokenRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let response = AuthService::new(state.service_context())
        .refresh_tokens(request)
        .await?;
    Ok(Json(response))
}

/// Revoke one refresh token, or every session when none is given
///
/// POST /auth/logout
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
    OptionalValidatedJson(request): OptionalValidatedJson<LogoutRequest>,
) -> ApiResult<NoContent> {
    AuthService::new(state.service_context())
        .logout(auth.user_id, request)
        .await?;
    Ok(NoContent)
}

/// GET /auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<CurrentUserResponse>> {
    let response = AuthService::new(state.service_context()).me(auth.user_id).await?;
    Ok(Json(response))
}

/// POST /auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<NoContent> {
    AuthService::new(state.service_context())
        .change_password(auth.user_id, request)
        .await?;
    Ok(NoContent)
}

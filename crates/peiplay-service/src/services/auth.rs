//! Authentication service
//!
//! Handles registration, login, token rotation, logout, and password changes.

use chrono::Utc;
use peiplay_cache::RefreshTokenData;
use peiplay_common::{hash_password, validate_password_strength, verify_password, AppError};
use peiplay_core::entities::{Customer, User};
use peiplay_core::{DomainError, Snowflake};
use tracing::{info, instrument, warn};

use crate::dto::{
    AuthResponse, ChangePasswordRequest, CurrentUserResponse, LoginRequest, LogoutRequest,
    RefreshTokenRequest, RegisterRequest,
};

use super::access::AccessService;
use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Emails are compared case-insensitively
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Authentication service
pub struct AuthService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Register a customer account
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> ServiceResult<AuthResponse> {
        validate_password_strength(&request.password)?;

        let email = normalize_email(&request.email);
        if self.ctx.user_repo().email_exists(&email).await? {
            return Err(DomainError::EmailAlreadyExists.into());
        }

        let password_hash = hash_password(&request.password)?;

        let user = User::new(self.ctx.generate_id(), email, request.name.trim().to_string());
        let customer = Customer::new(self.ctx.generate_id(), user.id);
        self.ctx
            .user_repo()
            .create_with_customer(&user, &customer, &password_hash)
            .await?;

        info!(user_id = %user.id, "User registered successfully");

        self.issue_tokens(&user).await
    }

    /// Login with email and password
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<AuthResponse> {
        let email = normalize_email(&request.email);
        let user = self
            .ctx
            .user_repo()
            .find_by_email(&email)
            .await?
            .ok_or_else(|| {
                warn!("Login failed: user not found");
                ServiceError::App(AppError::InvalidCredentials)
            })?;

        let password_hash = self
            .ctx
            .user_repo()
            .get_password_hash(user.id)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %user.id, "Login failed: no password hash");
                ServiceError::App(AppError::InvalidCredentials)
            })?;

        if !verify_password(&request.password, &password_hash)? {
            warn!(user_id = %user.id, "Login failed: invalid password");
            return Err(AppError::InvalidCredentials.into());
        }

        if user.is_suspended_at(Utc::now()) {
            warn!(user_id = %user.id, "Login refused: account suspended");
            return Err(DomainError::AccountSuspended {
                until: user.suspension_ends_at,
            }
            .into());
        }

        info!(user_id = %user.id, "User logged in successfully");

        self.issue_tokens(&user).await
    }

    /// Rotate a refresh token; the presented token stops working
    #[instrument(skip(self, request))]
    pub async fn refresh_tokens(&self, request: RefreshTokenRequest) -> ServiceResult<AuthResponse> {
        let claims = self
            .ctx
            .jwt_service()
            .validate_refresh_token(&request.refresh_token)?;

        let session = self
            .ctx
            .refresh_token_store()
            .validate(&claims.jti)
            .await?
            .ok_or(ServiceError::App(AppError::InvalidToken))?;

        if session.user_id != claims.user_id()? {
            warn!(user_id = %session.user_id, "Refresh token subject mismatch");
            return Err(AppError::InvalidToken.into());
        }

        self.ctx.refresh_token_store().revoke(&claims.jti).await?;

        let user = AccessService::new(self.ctx)
            .require_active_user(session.user_id)
            .await?;

        info!(user_id = %user.id, "Tokens refreshed");

        self.issue_tokens(&user).await
    }

    /// Revoke one session, or every session when no token is given
    #[instrument(skip(self, request))]
    pub async fn logout(&self, user_id: Snowflake, request: LogoutRequest) -> ServiceResult<()> {
        let store = self.ctx.refresh_token_store();
        match request.refresh_token {
            Some(token) => {
                let claims = self.ctx.jwt_service().validate_refresh_token(&token)?;
                if claims.user_id()? != user_id {
                    return Err(AppError::InvalidToken.into());
                }
                store.revoke(&claims.jti).await?;
                info!(user_id = %user_id, "Session revoked");
            }
            None => {
                let revoked = store.revoke_all_for_user(user_id).await?;
                info!(user_id = %user_id, revoked, "All sessions revoked");
            }
        }
        Ok(())
    }

    /// The caller with role and profile IDs
    #[instrument(skip(self))]
    pub async fn me(&self, user_id: Snowflake) -> ServiceResult<CurrentUserResponse> {
        let user = AccessService::new(self.ctx).require_user(user_id).await?;
        self.current_user(&user).await
    }

    #[instrument(skip(self, request))]
    pub async fn change_password(
        &self,
        user_id: Snowflake,
        request: ChangePasswordRequest,
    ) -> ServiceResult<()> {
        let current_hash = self
            .ctx
            .user_repo()
            .get_password_hash(user_id)
            .await?
            .ok_or(DomainError::UserNotFound(user_id))?;

        if !verify_password(&request.current_password, &current_hash)? {
            warn!(user_id = %user_id, "Password change refused: wrong current password");
            return Err(AppError::InvalidCredentials.into());
        }

        validate_password_strength(&request.new_password)?;
        let new_hash = hash_password(&request.new_password)?;
        self.ctx.user_repo().update_password(user_id, &new_hash).await?;

        info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    async fn issue_tokens(&self, user: &User) -> ServiceResult<AuthResponse> {
        let issued = self.ctx.jwt_service().issue(user.id)?;

        self.ctx
            .refresh_token_store()
            .store(
                &issued.refresh_jti,
                &RefreshTokenData::new(user.id),
                issued.refresh_ttl_secs,
            )
            .await?;

        Ok(AuthResponse {
            access_token: issued.pair.access_token,
            refresh_token: issued.pair.refresh_token,
            token_type: issued.pair.token_type,
            expires_in: issued.pair.expires_in,
            user: self.current_user(user).await?,
        })
    }

    async fn current_user(&self, user: &User) -> ServiceResult<CurrentUserResponse> {
        let customer = self.ctx.customer_repo().find_by_user(user.id).await?;
        let partner = self.ctx.partner_repo().find_by_user(user.id).await?;

        Ok(CurrentUserResponse {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            email_verified: user.email_verified,
            customer_id: customer.map(|c| c.id),
            partner_id: partner.as_ref().map(|p| p.id),
            partner_status: partner.map(|p| p.status),
            created_at: user.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Mika@Example.COM "), "mika@example.com");
    }
}

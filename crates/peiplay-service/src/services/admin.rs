//! Admin account management

use chrono::Utc;
use peiplay_core::entities::NotificationType;
use peiplay_core::traits::UserQuery;
use peiplay_core::{DomainError, Snowflake};
use tracing::{info, instrument, warn};

use crate::dto::{map_all, AdminUserQuery, PageParams, PaginatedResponse, SuspendUserRequest, UserResponse};

use super::access::AccessService;
use super::context::ServiceContext;
use super::error::ServiceResult;
use super::notification::NotificationService;

pub struct AdminUserService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AdminUserService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self, query))]
    pub async fn list(
        &self,
        admin_id: Snowflake,
        query: AdminUserQuery,
        page: PageParams,
    ) -> ServiceResult<PaginatedResponse<UserResponse>> {
        AccessService::new(self.ctx).require_admin(admin_id).await?;

        let filter = UserQuery {
            role: query.role,
            search: query.search.filter(|s| !s.trim().is_empty()),
            limit: page.limit,
            offset: page.offset(),
        };
        let repo = self.ctx.user_repo();
        let users = repo.list(&filter).await?;
        let total = repo.count(&filter).await?;
        Ok(PaginatedResponse::new(map_all(&users), page, total))
    }

    /// Suspend for `days` and sign the user out everywhere
    #[instrument(skip(self, request), fields(days = request.days))]
    pub async fn suspend(
        &self,
        admin_id: Snowflake,
        user_id: Snowflake,
        request: SuspendUserRequest,
    ) -> ServiceResult<UserResponse> {
        let access = AccessService::new(self.ctx);
        access.require_admin(admin_id).await?;
        if admin_id == user_id {
            return Err(DomainError::Forbidden("cannot suspend yourself".to_string()).into());
        }

        let reason = request.reason.trim().to_string();
        if reason.is_empty() {
            return Err(DomainError::ReasonRequired.into());
        }
        if request.days < 0 {
            return Err(DomainError::ValidationError("days must not be negative".to_string()).into());
        }

        let mut user = access.require_user(user_id).await?;
        user.suspend(reason, request.days, Utc::now());
        self.ctx.user_repo().update_suspension(&user).await?;

        match self.ctx.refresh_token_store().revoke_all_for_user(user_id).await {
            Ok(revoked) => info!(user_id = %user_id, revoked, "User suspended"),
            Err(e) => warn!(user_id = %user_id, error = %e, "Suspended but sessions not revoked"),
        }

        NotificationService::new(self.ctx)
            .notify(
                user_id,
                NotificationType::System,
                "Account suspended",
                format!(
                    "Your account has been suspended for {} day(s): {}",
                    request.days,
                    user.suspension_reason.as_deref().unwrap_or_default()
                ),
                None,
            )
            .await;

        Ok(UserResponse::from(&user))
    }

    #[instrument(skip(self))]
    pub async fn unsuspend(&self, admin_id: Snowflake, user_id: Snowflake) -> ServiceResult<UserResponse> {
        let access = AccessService::new(self.ctx);
        access.require_admin(admin_id).await?;

        let mut user = access.require_user(user_id).await?;
        user.lift_suspension();
        self.ctx.user_repo().update_suspension(&user).await?;

        info!(user_id = %user_id, "Suspension lifted");
        Ok(UserResponse::from(&user))
    }

    #[instrument(skip(self))]
    pub async fn verify(&self, admin_id: Snowflake, user_id: Snowflake) -> ServiceResult<UserResponse> {
        let access = AccessService::new(self.ctx);
        access.require_admin(admin_id).await?;

        let mut user = access.require_user(user_id).await?;
        self.ctx.user_repo().set_email_verified(user_id, true).await?;
        user.email_verified = true;
        Ok(UserResponse::from(&user))
    }

    /// Soft delete; sessions are revoked so outstanding tokens stop refreshing
    #[instrument(skip(self))]
    pub async fn delete(&self, admin_id: Snowflake, user_id: Snowflake) -> ServiceResult<()> {
        let access = AccessService::new(self.ctx);
        access.require_admin(admin_id).await?;
        if admin_id == user_id {
            return Err(DomainError::Forbidden("cannot delete yourself".to_string()).into());
        }

        access.require_user(user_id).await?;
        self.ctx.user_repo().delete(user_id).await?;

        if let Err(e) = self.ctx.refresh_token_store().revoke_all_for_user(user_id).await {
            warn!(user_id = %user_id, error = %e, "Failed to revoke sessions of deleted user");
        }

        info!(user_id = %user_id, admin_id = %admin_id, "User deleted");
        Ok(())
    }
}

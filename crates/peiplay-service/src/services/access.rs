//! Access service
//!
//! Resolves the caller's account and profiles from the database. Roles are
//! never taken from the token, so every privileged operation starts here.

use chrono::Utc;
use peiplay_core::entities::{Customer, Partner, User};
use peiplay_core::{DomainError, Snowflake};
use tracing::{debug, instrument};

use super::context::ServiceContext;
use super::error::ServiceResult;

pub struct AccessService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AccessService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Load the caller; a deleted account reads as missing
    #[instrument(skip(self))]
    pub async fn require_user(&self, user_id: Snowflake) -> ServiceResult<User> {
        let user = self
            .ctx
            .user_repo()
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::UserNotFound(user_id))?;
        Ok(user)
    }

    /// Load the caller and reject accounts under an active suspension
    #[instrument(skip(self))]
    pub async fn require_active_user(&self, user_id: Snowflake) -> ServiceResult<User> {
        let user = self.require_user(user_id).await?;
        if user.is_suspended_at(Utc::now()) {
            return Err(DomainError::AccountSuspended {
                until: user.suspension_ends_at,
            }
            .into());
        }
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn require_admin(&self, user_id: Snowflake) -> ServiceResult<User> {
        let user = self.require_user(user_id).await?;
        if !user.is_admin() {
            debug!(user_id = %user_id, role = %user.role.as_str(), "Admin check failed");
            return Err(DomainError::AdminRequired.into());
        }
        Ok(user)
    }

    /// Whether the caller currently holds the admin role
    pub async fn is_admin(&self, user_id: Snowflake) -> ServiceResult<bool> {
        Ok(self.require_user(user_id).await?.is_admin())
    }

    #[instrument(skip(self))]
    pub async fn require_customer(&self, user_id: Snowflake) -> ServiceResult<Customer> {
        let customer = self
            .ctx
            .customer_repo()
            .find_by_user(user_id)
            .await?
            .ok_or(DomainError::CustomerNotFound)?;
        Ok(customer)
    }

    /// The caller's partner profile in any review state
    #[instrument(skip(self))]
    pub async fn require_partner(&self, user_id: Snowflake) -> ServiceResult<Partner> {
        let partner = self
            .ctx
            .partner_repo()
            .find_by_user(user_id)
            .await?
            .ok_or(DomainError::PartnerRequired)?;
        Ok(partner)
    }

    #[instrument(skip(self))]
    pub async fn require_approved_partner(&self, user_id: Snowflake) -> ServiceResult<Partner> {
        let partner = self.require_partner(user_id).await?;
        if !partner.is_approved() {
            return Err(DomainError::PartnerNotApproved.into());
        }
        Ok(partner)
    }

    /// Public lookup by partner ID
    #[instrument(skip(self))]
    pub async fn find_partner(&self, partner_id: Snowflake) -> ServiceResult<Partner> {
        let partner = self
            .ctx
            .partner_repo()
            .find_by_id(partner_id)
            .await?
            .ok_or(DomainError::PartnerNotFound)?;
        Ok(partner)
    }
}

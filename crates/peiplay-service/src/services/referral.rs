//! Referral service
//!
//! Approved partners hand out invite codes. A new partner who applies with a
//! code earns the inviter a commission on each of their completed bookings.

use chrono::{DateTime, Utc};
use peiplay_core::entities::{Partner, ReferralOutcome, ReferralRecord};
use peiplay_core::{DomainError, Snowflake};
use tracing::{debug, info, instrument, warn};

use crate::dto::{
    map_all, ReferralCodeRequest, ReferralCodeResponse, ReferralStatsResponse,
    ReferralSweepResponse, ReferralValidationResponse,
};

use super::access::AccessService;
use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Attempts at finding an unused invite code
const CODE_ATTEMPTS: usize = 5;

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

pub struct ReferralService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ReferralService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// The caller's invite code, generated on first request
    #[instrument(skip(self))]
    pub async fn generate_code(&self, user_id: Snowflake) -> ServiceResult<ReferralCodeResponse> {
        let partner = AccessService::new(self.ctx)
            .require_approved_partner(user_id)
            .await?;
        if let Some(code) = partner.invite_code {
            return Ok(ReferralCodeResponse { invite_code: code });
        }

        for attempt in 1..=CODE_ATTEMPTS {
            let candidate = partner.referral_code_candidate();
            match self.ctx.partner_repo().set_invite_code(partner.id, &candidate).await {
                Ok(()) => {
                    info!(partner_id = %partner.id, "Invite code generated");
                    return Ok(ReferralCodeResponse {
                        invite_code: candidate,
                    });
                }
                Err(DomainError::ReferralCodeTaken) => {
                    debug!(attempt, "Invite code collision");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ServiceError::internal("could not allocate an invite code"))
    }

    #[instrument(skip(self))]
    pub async fn validate_code(&self, code: &str) -> ServiceResult<ReferralValidationResponse> {
        let inviter = self
            .ctx
            .partner_repo()
            .find_by_invite_code(&normalize_code(code))
            .await?;
        Ok(ReferralValidationResponse {
            valid: inviter.is_some(),
            inviter_name: inviter.map(|p| p.name),
        })
    }

    /// Attach the caller's partner profile to an inviter
    #[instrument(skip(self, request))]
    pub async fn apply_code(
        &self,
        user_id: Snowflake,
        request: ReferralCodeRequest,
    ) -> ServiceResult<ReferralValidationResponse> {
        let partner = AccessService::new(self.ctx).require_partner(user_id).await?;
        let inviter_id = self.apply_for_partner(&partner, &request.code).await?;
        let inviter = AccessService::new(self.ctx).find_partner(inviter_id).await?;
        Ok(ReferralValidationResponse {
            valid: true,
            inviter_name: Some(inviter.name),
        })
    }

    /// Record the referral; returns the inviter's partner ID
    pub async fn apply_for_partner(&self, partner: &Partner, code: &str) -> ServiceResult<Snowflake> {
        if partner.invited_by.is_some() {
            return Err(DomainError::ReferralAlreadyApplied.into());
        }

        let code = normalize_code(code);
        let inviter = self
            .ctx
            .partner_repo()
            .find_by_invite_code(&code)
            .await?
            .ok_or_else(|| DomainError::ReferralCodeNotFound(code.clone()))?;
        if inviter.id == partner.id {
            return Err(DomainError::OwnReferralCode.into());
        }

        let record = ReferralRecord {
            id: self.ctx.generate_id(),
            inviter_id: inviter.id,
            invitee_id: partner.id,
            invite_code: code,
            created_at: Utc::now(),
        };
        self.ctx.referral_repo().create(&record).await?;

        info!(inviter_id = %inviter.id, invitee_id = %partner.id, "Referral recorded");
        Ok(inviter.id)
    }

    #[instrument(skip(self))]
    pub async fn stats(&self, user_id: Snowflake) -> ServiceResult<ReferralStatsResponse> {
        let partner = AccessService::new(self.ctx).require_partner(user_id).await?;
        let invitees = self.ctx.referral_repo().invitees(partner.id).await?;

        Ok(ReferralStatsResponse {
            invite_code: partner.invite_code,
            referral_count: partner.referral_count,
            referral_earnings: partner.referral_earnings,
            invitees: map_all(&invitees),
        })
    }

    /// Commission for one completed booking; safe to repeat
    #[instrument(skip(self))]
    pub async fn calculate_for_booking(&self, booking_id: Snowflake) -> ServiceResult<ReferralOutcome> {
        let outcome = self
            .ctx
            .referral_repo()
            .calculate_for_booking(booking_id, self.ctx.generate_id())
            .await?;

        if let ReferralOutcome::Calculated { amount, percentage } = &outcome {
            info!(booking_id = %booking_id, %amount, %percentage, "Referral earning recorded");
        } else {
            debug!(booking_id = %booking_id, ?outcome, "No referral earning");
        }
        Ok(outcome)
    }

    /// Catch up on completed bookings that have no earning yet
    #[instrument(skip(self))]
    pub async fn sweep_since(&self, since: DateTime<Utc>) -> ServiceResult<ReferralSweepResponse> {
        let pending = self
            .ctx
            .referral_repo()
            .bookings_pending_calculation(since)
            .await?;

        let mut calculated = 0;
        for booking_id in &pending {
            match self.calculate_for_booking(*booking_id).await {
                Ok(outcome) if outcome.is_calculated() => calculated += 1,
                Ok(_) => {}
                Err(e) => warn!(booking_id = %booking_id, error = %e, "Referral calculation failed"),
            }
        }

        info!(processed = pending.len(), calculated, "Referral sweep finished");
        Ok(ReferralSweepResponse {
            processed: pending.len(),
            calculated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code(" abcd12341234 "), "ABCD12341234");
    }
}

//! Partner service
//!
//! Applications, profile edits, the "available now" switch, public browsing,
//! and admin review.

use chrono::Utc;
use peiplay_cache::PubSubChannel;
use peiplay_core::entities::{BusyStatus, NotificationType, Partner, PartnerStatus};
use peiplay_core::events::{DomainEvent, PartnerAvailabilityChangedEvent};
use peiplay_core::traits::PartnerQuery;
use peiplay_core::{DomainError, Snowflake};
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use crate::dto::{
    map_all, AdminPartnerQuery, ApplyPartnerRequest, OwnPartnerResponse, PageParams,
    PartnerDetailResponse, PartnerListQuery, PartnerResponse, ReviewPartnerRequest,
    ScheduleResponse, SetAvailabilityRequest, TimeWindowQuery, UpdatePartnerRequest,
};

use super::access::AccessService;
use super::context::ServiceContext;
use super::error::ServiceResult;
use super::notification::NotificationService;
use super::referral::ReferralService;

/// Trim, drop blanks, and de-duplicate game names keeping first occurrence
fn clean_games(games: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(games.len());
    for game in games {
        let game = game.trim().to_string();
        if !game.is_empty() && !cleaned.contains(&game) {
            cleaned.push(game);
        }
    }
    cleaned
}

fn ensure_positive_rate(rate: Decimal) -> Result<(), DomainError> {
    if rate <= Decimal::ZERO {
        return Err(DomainError::ValidationError(
            "half_hourly_rate must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

pub struct PartnerService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> PartnerService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Submit a partner application; one per user
    #[instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn apply(
        &self,
        user_id: Snowflake,
        request: ApplyPartnerRequest,
    ) -> ServiceResult<OwnPartnerResponse> {
        ensure_positive_rate(request.half_hourly_rate)?;
        let games = clean_games(request.games);
        if games.is_empty() {
            return Err(DomainError::ValidationError("at least one game is required".to_string()).into());
        }

        AccessService::new(self.ctx).require_active_user(user_id).await?;

        let mut partner = Partner::new(
            self.ctx.generate_id(),
            user_id,
            request.name.trim().to_string(),
            games,
            request.half_hourly_rate,
        );
        partner.customer_message = request.customer_message.filter(|m| !m.trim().is_empty());
        self.ctx.partner_repo().create(&partner).await?;

        info!(partner_id = %partner.id, "Partner application submitted");

        if let Some(code) = request.invite_code.filter(|c| !c.trim().is_empty()) {
            let referrals = ReferralService::new(self.ctx);
            match referrals.apply_for_partner(&partner, &code).await {
                Ok(inviter_id) => partner.invited_by = Some(inviter_id),
                Err(e) => {
                    warn!(partner_id = %partner.id, error = %e, "Invite code not applied");
                }
            }
        }

        Ok(OwnPartnerResponse::from(&partner))
    }

    #[instrument(skip(self))]
    pub async fn get_self(&self, user_id: Snowflake) -> ServiceResult<OwnPartnerResponse> {
        let partner = AccessService::new(self.ctx).require_partner(user_id).await?;
        Ok(OwnPartnerResponse::from(&partner))
    }

    #[instrument(skip(self, request))]
    pub async fn update_self(
        &self,
        user_id: Snowflake,
        request: UpdatePartnerRequest,
    ) -> ServiceResult<OwnPartnerResponse> {
        let mut partner = AccessService::new(self.ctx).require_partner(user_id).await?;

        if let Some(name) = request.name {
            partner.name = name.trim().to_string();
        }
        if let Some(games) = request.games {
            let games = clean_games(games);
            if games.is_empty() {
                return Err(DomainError::ValidationError("at least one game is required".to_string()).into());
            }
            partner.games = games;
        }
        if let Some(rate) = request.half_hourly_rate {
            ensure_positive_rate(rate)?;
            partner.half_hourly_rate = rate;
        }
        if let Some(message) = request.customer_message {
            partner.customer_message = Some(message).filter(|m| !m.trim().is_empty());
        }
        partner.updated_at = Utc::now();

        self.ctx.partner_repo().update_profile(&partner).await?;
        info!(partner_id = %partner.id, "Partner profile updated");

        Ok(OwnPartnerResponse::from(&partner))
    }

    /// Flip the "available now" switch; only approved partners may turn it on
    #[instrument(skip(self, request), fields(available = request.is_available_now))]
    pub async fn set_availability(
        &self,
        user_id: Snowflake,
        request: SetAvailabilityRequest,
    ) -> ServiceResult<OwnPartnerResponse> {
        let mut partner = AccessService::new(self.ctx).require_partner(user_id).await?;
        let now = Utc::now();
        partner.set_available_now(request.is_available_now, now)?;

        self.ctx
            .partner_repo()
            .set_availability(partner.id, partner.is_available_now, partner.available_now_since)
            .await?;

        info!(partner_id = %partner.id, available = partner.is_available_now, "Availability changed");

        let event = DomainEvent::PartnerAvailabilityChanged(PartnerAvailabilityChangedEvent {
            partner_id: partner.id,
            is_available_now: partner.is_available_now,
            timestamp: now,
        });
        if let Err(e) = self
            .ctx
            .publisher()
            .publish_domain_event(&[PubSubChannel::Broadcast], &event)
            .await
        {
            warn!(partner_id = %partner.id, error = %e, "Failed to publish availability change");
        }

        Ok(OwnPartnerResponse::from(&partner))
    }

    /// Approved partners whose accounts are not suspended
    #[instrument(skip(self, query))]
    pub async fn list(
        &self,
        query: PartnerListQuery,
        page: PageParams,
    ) -> ServiceResult<Vec<PartnerResponse>> {
        let query = PartnerQuery {
            status: Some(PartnerStatus::Approved),
            game: query.game.map(|g| g.trim().to_string()).filter(|g| !g.is_empty()),
            available_now: query.available_now,
            limit: page.limit,
            offset: page.offset(),
        };
        let partners = self.ctx.partner_repo().list_public(&query, Utc::now()).await?;
        Ok(map_all(&partners))
    }

    /// Public profile with rating summary
    #[instrument(skip(self))]
    pub async fn get(&self, partner_id: Snowflake) -> ServiceResult<PartnerDetailResponse> {
        let partner = AccessService::new(self.ctx).find_partner(partner_id).await?;
        if !partner.is_approved() {
            return Err(DomainError::PartnerNotFound.into());
        }
        let rating = self.ctx.review_repo().rating_summary(partner.user_id).await?;

        Ok(PartnerDetailResponse {
            partner: PartnerResponse::from(&partner),
            average_rating: rating.average,
            review_count: rating.count,
        })
    }

    /// Open slots that can still be booked
    #[instrument(skip(self))]
    pub async fn schedules(
        &self,
        partner_id: Snowflake,
        window: TimeWindowQuery,
    ) -> ServiceResult<Vec<ScheduleResponse>> {
        AccessService::new(self.ctx).find_partner(partner_id).await?;
        let from = window.from.unwrap_or_else(Utc::now);
        let schedules = self
            .ctx
            .schedule_repo()
            .find_bookable(partner_id, from, window.to)
            .await?;
        Ok(map_all(&schedules))
    }

    /// Whether the partner is in a session right now
    #[instrument(skip(self))]
    pub async fn busy_status(&self, partner_id: Snowflake) -> ServiceResult<BusyStatus> {
        AccessService::new(self.ctx).find_partner(partner_id).await?;
        let now = Utc::now();
        let current = self
            .ctx
            .booking_repo()
            .find_current_for_partner(partner_id, now)
            .await?;
        Ok(BusyStatus::from_current(current.as_ref(), now))
    }

    #[instrument(skip(self, query))]
    pub async fn admin_list(
        &self,
        admin_id: Snowflake,
        query: AdminPartnerQuery,
        page: PageParams,
    ) -> ServiceResult<Vec<OwnPartnerResponse>> {
        AccessService::new(self.ctx).require_admin(admin_id).await?;
        let query = PartnerQuery {
            status: query.status,
            limit: page.limit,
            offset: page.offset(),
            ..PartnerQuery::default()
        };
        let partners = self.ctx.partner_repo().list(&query).await?;
        Ok(map_all(&partners))
    }

    /// Approve or reject an application and tell the applicant
    #[instrument(skip(self, request), fields(status = request.status.as_str()))]
    pub async fn admin_review(
        &self,
        admin_id: Snowflake,
        partner_id: Snowflake,
        request: ReviewPartnerRequest,
    ) -> ServiceResult<OwnPartnerResponse> {
        AccessService::new(self.ctx).require_admin(admin_id).await?;
        if request.status == PartnerStatus::Pending {
            return Err(DomainError::ValidationError(
                "status must be APPROVED or REJECTED".to_string(),
            )
            .into());
        }

        let partner = self.ctx.partner_repo().review(partner_id, request.status).await?;
        info!(partner_id = %partner_id, admin_id = %admin_id, "Partner application reviewed");

        let (title, content) = match request.status {
            PartnerStatus::Approved => (
                "Partner application approved",
                "Your partner profile is live. You can now add schedules and accept bookings."
                    .to_string(),
            ),
            _ => (
                "Partner application rejected",
                match request.reason.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
                    Some(reason) => format!("Your partner application was rejected: {reason}"),
                    None => "Your partner application was rejected.".to_string(),
                },
            ),
        };
        NotificationService::new(self.ctx)
            .notify(
                partner.user_id,
                NotificationType::PartnerReview,
                title,
                content,
                Some(serde_json::json!({
                    "partner_id": partner.id,
                    "status": partner.status,
                    "reason": request.reason,
                })),
            )
            .await;

        Ok(OwnPartnerResponse::from(&partner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_games() {
        let games = clean_games(vec![
            " Valorant ".to_string(),
            String::new(),
            "Valorant".to_string(),
            "LoL".to_string(),
        ]);
        assert_eq!(games, vec!["Valorant".to_string(), "LoL".to_string()]);
    }

    #[test]
    fn test_rate_must_be_positive() {
        assert!(ensure_positive_rate(Decimal::ZERO).is_err());
        assert!(ensure_positive_rate(Decimal::new(-1, 0)).is_err());
        assert!(ensure_positive_rate(Decimal::new(150, 0)).is_ok());
    }
}

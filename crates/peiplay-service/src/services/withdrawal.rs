//! Withdrawal service
//!
//! Partners cash out booking revenue; admins approve, reject, and mark
//! payouts completed.

use chrono::Utc;
use peiplay_cache::PubSubChannel;
use peiplay_core::entities::{
    NotificationType, WithdrawalBalance, WithdrawalRequest, WithdrawalStatus,
};
use peiplay_core::events::{DomainEvent, WithdrawalRequestedEvent};
use peiplay_core::value_objects::round_money;
use peiplay_core::{DomainError, Snowflake};
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use crate::dto::{
    map_all, CreateWithdrawalRequest, PageParams, ProcessWithdrawalRequest,
    WithdrawalCreatedResponse, WithdrawalHistoryResponse, WithdrawalListQuery, WithdrawalResponse,
};

use super::access::AccessService;
use super::context::ServiceContext;
use super::error::ServiceResult;
use super::notification::NotificationService;

fn status_message(status: WithdrawalStatus, note: Option<&str>) -> String {
    let base = match status {
        WithdrawalStatus::Approved => "Your withdrawal request was approved",
        WithdrawalStatus::Rejected => "Your withdrawal request was rejected",
        WithdrawalStatus::Completed => "Your withdrawal has been paid out",
        WithdrawalStatus::Pending => "Your withdrawal request is pending",
    };
    match note.map(str::trim).filter(|n| !n.is_empty()) {
        Some(note) => format!("{base}: {note}"),
        None => base.to_string(),
    }
}

pub struct WithdrawalService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> WithdrawalService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Open a withdrawal request against the current balance
    #[instrument(skip(self, request), fields(user_id = %user_id, amount = %request.amount))]
    pub async fn request(
        &self,
        user_id: Snowflake,
        request: CreateWithdrawalRequest,
    ) -> ServiceResult<WithdrawalCreatedResponse> {
        let partner = AccessService::new(self.ctx).require_partner(user_id).await?;
        if request.amount <= Decimal::ZERO {
            return Err(DomainError::ValidationError("amount must be greater than 0".to_string()).into());
        }

        let now = Utc::now();
        let withdrawal =
            WithdrawalRequest::new(self.ctx.generate_id(), partner.id, round_money(request.amount), now);
        let balance = self
            .ctx
            .withdrawal_repo()
            .create_checked(&withdrawal, self.ctx.platform().platform_fee_rate)
            .await?;

        info!(withdrawal_id = %withdrawal.id, partner_id = %partner.id, "Withdrawal requested");

        match self.ctx.user_repo().find_admin_ids().await {
            Ok(admins) => {
                NotificationService::new(self.ctx)
                    .notify_all(
                        &admins,
                        NotificationType::WithdrawalUpdate,
                        "New withdrawal request",
                        &format!("{} requested a withdrawal of {}", partner.name, withdrawal.amount),
                        Some(serde_json::json!({
                            "withdrawal_id": withdrawal.id,
                            "partner_id": partner.id,
                            "amount": withdrawal.amount,
                        })),
                    )
                    .await;
            }
            Err(e) => warn!(error = %e, "Could not load admins for withdrawal notice"),
        }

        let event = DomainEvent::WithdrawalRequested(WithdrawalRequestedEvent {
            withdrawal_id: withdrawal.id,
            partner_id: partner.id,
            amount: withdrawal.amount,
            timestamp: now,
        });
        if let Err(e) = self
            .ctx
            .publisher()
            .publish_domain_event(&[PubSubChannel::Admin], &event)
            .await
        {
            warn!(withdrawal_id = %withdrawal.id, error = %e, "Failed to publish withdrawal event");
        }

        Ok(WithdrawalCreatedResponse {
            withdrawal: WithdrawalResponse::from(&withdrawal),
            available_balance: round_money(balance.available_balance - withdrawal.amount),
        })
    }

    /// The caller's requests and current balance
    #[instrument(skip(self))]
    pub async fn history(&self, user_id: Snowflake) -> ServiceResult<WithdrawalHistoryResponse> {
        let partner = AccessService::new(self.ctx).require_partner(user_id).await?;
        let repo = self.ctx.withdrawal_repo();
        let requests = repo.list_by_partner(partner.id).await?;
        let summary = repo.earnings_summary(partner.id).await?;
        let balance = WithdrawalBalance::compute(&summary, self.ctx.platform().platform_fee_rate);

        Ok(WithdrawalHistoryResponse {
            withdrawals: map_all(&requests),
            total_earnings: balance.total_earnings,
            total_withdrawn: balance.total_withdrawn,
            available_balance: balance.available_balance,
        })
    }

    #[instrument(skip(self, query))]
    pub async fn admin_list(
        &self,
        admin_id: Snowflake,
        query: WithdrawalListQuery,
        page: PageParams,
    ) -> ServiceResult<Vec<WithdrawalResponse>> {
        AccessService::new(self.ctx).require_admin(admin_id).await?;
        let requests = self
            .ctx
            .withdrawal_repo()
            .list(query.status, page.limit, page.offset())
            .await?;
        Ok(map_all(&requests))
    }

    /// Move a request along PENDING → APPROVED/REJECTED → COMPLETED
    #[instrument(skip(self, request), fields(to = request.status.as_str()))]
    pub async fn admin_process(
        &self,
        admin_id: Snowflake,
        withdrawal_id: Snowflake,
        request: ProcessWithdrawalRequest,
    ) -> ServiceResult<WithdrawalResponse> {
        let access = AccessService::new(self.ctx);
        access.require_admin(admin_id).await?;

        let repo = self.ctx.withdrawal_repo();
        let mut withdrawal = repo
            .find_by_id(withdrawal_id)
            .await?
            .ok_or(DomainError::WithdrawalNotFound(withdrawal_id))?;

        let expected = withdrawal.status;
        let note = request.admin_note.filter(|n| !n.trim().is_empty());
        withdrawal.process(request.status, note, Utc::now())?;
        repo.save_processed(&withdrawal, expected).await?;

        info!(withdrawal_id = %withdrawal_id, admin_id = %admin_id, status = withdrawal.status.as_str(), "Withdrawal processed");

        let partner = access.find_partner(withdrawal.partner_id).await?;
        NotificationService::new(self.ctx)
            .notify(
                partner.user_id,
                NotificationType::WithdrawalUpdate,
                "Withdrawal update",
                status_message(withdrawal.status, withdrawal.admin_note.as_deref()),
                Some(serde_json::json!({
                    "withdrawal_id": withdrawal.id,
                    "status": withdrawal.status,
                    "amount": withdrawal.amount,
                })),
            )
            .await;

        Ok(WithdrawalResponse::from(&withdrawal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_includes_note() {
        assert_eq!(
            status_message(WithdrawalStatus::Rejected, Some("bank details missing")),
            "Your withdrawal request was rejected: bank details missing"
        );
        assert_eq!(
            status_message(WithdrawalStatus::Completed, Some("  ")),
            "Your withdrawal has been paid out"
        );
    }
}

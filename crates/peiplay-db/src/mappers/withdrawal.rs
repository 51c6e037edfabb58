//! Withdrawal mappers

use peiplay_core::{DomainError, EarningsSummary, Snowflake, WithdrawalRequest, WithdrawalStatus};

use super::parse_column;
use crate::models::{EarningsSummaryModel, WithdrawalModel};

impl TryFrom<WithdrawalModel> for WithdrawalRequest {
    type Error = DomainError;

    fn try_from(model: WithdrawalModel) -> Result<Self, Self::Error> {
        Ok(WithdrawalRequest {
            id: Snowflake::new(model.id),
            partner_id: Snowflake::new(model.partner_id),
            amount: model.amount,
            status: parse_column(
                &model.status,
                "withdrawal_requests.status",
                WithdrawalStatus::parse,
            )?,
            admin_note: model.admin_note,
            requested_at: model.requested_at,
            processed_at: model.processed_at,
        })
    }
}

impl From<EarningsSummaryModel> for EarningsSummary {
    fn from(model: EarningsSummaryModel) -> Self {
        EarningsSummary {
            booking_total: model.booking_total,
            referral_earnings: model.referral_earnings,
            withdrawn_total: model.withdrawn_total,
        }
    }
}

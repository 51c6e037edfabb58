//! Withdrawal requests and the partner balance they draw from

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::{round_money, Snowflake};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl WithdrawalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Completed => "COMPLETED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            "COMPLETED" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn can_transition_to(self, to: WithdrawalStatus) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Approved | Self::Rejected) | (Self::Approved, Self::Completed)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithdrawalRequest {
    pub id: Snowflake,
    pub partner_id: Snowflake,
    pub amount: Decimal,
    pub status: WithdrawalStatus,
    pub admin_note: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl WithdrawalRequest {
    pub fn new(id: Snowflake, partner_id: Snowflake, amount: Decimal, now: DateTime<Utc>) -> Self {
        Self {
            id,
            partner_id,
            amount,
            status: WithdrawalStatus::Pending,
            admin_note: None,
            requested_at: now,
            processed_at: None,
        }
    }

    pub fn process(
        &mut self,
        to: WithdrawalStatus,
        admin_note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if !self.status.can_transition_to(to) {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status.as_str().to_string(),
                to: to.as_str().to_string(),
            });
        }
        self.status = to;
        if admin_note.is_some() {
            self.admin_note = admin_note;
        }
        self.processed_at = Some(now);
        Ok(())
    }
}

/// Raw sums read from storage for one partner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EarningsSummary {
    /// Final amounts of completed and confirmed bookings
    pub booking_total: Decimal,
    pub referral_earnings: Decimal,
    /// Approved and completed withdrawals
    pub withdrawn_total: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WithdrawalBalance {
    pub total_earnings: Decimal,
    pub total_withdrawn: Decimal,
    pub available_balance: Decimal,
}

impl WithdrawalBalance {
    /// `booking_total × (1 − fee) + referral_earnings − withdrawn_total`
    pub fn compute(summary: &EarningsSummary, platform_fee_rate: Decimal) -> Self {
        let total_earnings = round_money(
            summary.booking_total * (Decimal::ONE - platform_fee_rate) + summary.referral_earnings,
        );
        let available = round_money(total_earnings - summary.withdrawn_total);
        Self {
            total_earnings,
            total_withdrawn: round_money(summary.withdrawn_total),
            available_balance: available,
        }
    }

    pub fn ensure_covers(&self, amount: Decimal) -> Result<(), DomainError> {
        if amount > self.available_balance {
            return Err(DomainError::InsufficientBalance {
                available: self.available_balance,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fee() -> Decimal {
        Decimal::new(15, 2)
    }

    #[test]
    fn test_balance_formula() {
        let summary = EarningsSummary {
            booking_total: Decimal::from(1000),
            referral_earnings: Decimal::from(40),
            withdrawn_total: Decimal::from(300),
        };
        let balance = WithdrawalBalance::compute(&summary, fee());
        assert_eq!(balance.total_earnings, Decimal::from(890));
        assert_eq!(balance.available_balance, Decimal::from(590));
    }

    #[test]
    fn test_amount_cannot_exceed_available() {
        let balance = WithdrawalBalance::compute(
            &EarningsSummary {
                booking_total: Decimal::from(100),
                ..Default::default()
            },
            fee(),
        );
        assert!(balance.ensure_covers(Decimal::from(85)).is_ok());
        assert!(matches!(
            balance.ensure_covers(Decimal::new(8501, 2)),
            Err(DomainError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn test_processing_rules() {
        let now = Utc::now();
        let mut w = WithdrawalRequest::new(Snowflake::new(1), Snowflake::new(2), Decimal::TEN, now);
        assert!(w.process(WithdrawalStatus::Completed, None, now).is_err());
        w.process(WithdrawalStatus::Approved, Some("ok".into()), now).unwrap();
        assert_eq!(w.processed_at, Some(now));
        w.process(WithdrawalStatus::Completed, None, now).unwrap();
        assert_eq!(w.admin_note.as_deref(), Some("ok"));
        assert!(w.process(WithdrawalStatus::Rejected, None, now).is_err());
    }
}

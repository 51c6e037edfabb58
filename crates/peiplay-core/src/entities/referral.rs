//! Partner-to-partner referrals and the earnings they generate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::value_objects::{round_money, Snowflake};

/// Links an inviting partner to the partner who used their code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferralRecord {
    pub id: Snowflake,
    pub inviter_id: Snowflake,
    pub invitee_id: Snowflake,
    pub invite_code: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferralEarning {
    pub id: Snowflake,
    pub referral_record_id: Snowflake,
    pub booking_id: Snowflake,
    pub amount: Decimal,
    pub percentage: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Commission rate in percent for an inviter with `referral_count` invitees
pub fn referral_percentage(referral_count: i32) -> Decimal {
    match referral_count {
        i32::MIN..=3 => Decimal::from(2),
        4..=10 => Decimal::from(3),
        _ => Decimal::from(4),
    }
}

/// Commission owed on `booking_amount`
pub fn referral_commission(booking_amount: Decimal, referral_count: i32) -> (Decimal, Decimal) {
    let pct = referral_percentage(referral_count);
    (round_money(booking_amount * pct / Decimal::ONE_HUNDRED), pct)
}

/// What happened when earnings were computed for a booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferralOutcome {
    Calculated { amount: Decimal, percentage: Decimal },
    NoReferral,
    Skipped,
    AlreadyCalculated,
}

impl ReferralOutcome {
    pub fn is_calculated(&self) -> bool {
        matches!(self, Self::Calculated { .. })
    }
}

/// Invitee row for the inviter's dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct ReferralInvitee {
    pub partner_id: Snowflake,
    pub name: String,
    pub joined_at: DateTime<Utc>,
    pub earned: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers() {
        assert_eq!(referral_percentage(0), Decimal::from(2));
        assert_eq!(referral_percentage(3), Decimal::from(2));
        assert_eq!(referral_percentage(4), Decimal::from(3));
        assert_eq!(referral_percentage(10), Decimal::from(3));
        assert_eq!(referral_percentage(11), Decimal::from(4));
    }

    #[test]
    fn test_commission() {
        let (amount, pct) = referral_commission(Decimal::new(45_050, 2), 5);
        assert_eq!(pct, Decimal::from(3));
        assert_eq!(amount, Decimal::new(1352, 2));
    }
}

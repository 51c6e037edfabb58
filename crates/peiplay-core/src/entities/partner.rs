//! Partner entity - a companion offering bookable time

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::{round_money, Snowflake, TimeRange};

/// Application review state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartnerStatus {
    Pending,
    Approved,
    Rejected,
}

impl PartnerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Partner {
    pub id: Snowflake,
    pub user_id: Snowflake,
    pub name: String,
    pub games: Vec<String>,
    pub half_hourly_rate: Decimal,
    pub status: PartnerStatus,
    pub customer_message: Option<String>,
    pub is_available_now: bool,
    pub available_now_since: Option<DateTime<Utc>>,
    pub invite_code: Option<String>,
    pub invited_by: Option<Snowflake>,
    pub referral_count: i32,
    pub referral_earnings: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Partner {
    /// Create a pending application
    pub fn new(
        id: Snowflake,
        user_id: Snowflake,
        name: String,
        games: Vec<String>,
        half_hourly_rate: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            name,
            games,
            half_hourly_rate,
            status: PartnerStatus::Pending,
            customer_message: None,
            is_available_now: false,
            available_now_since: None,
            invite_code: None,
            invited_by: None,
            referral_count: 0,
            referral_earnings: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    #[inline]
    pub fn is_approved(&self) -> bool {
        self.status == PartnerStatus::Approved
    }

    /// Price of a session: `hours × half_hourly_rate × 2`, rounded to cents
    pub fn price_for(&self, window: &TimeRange) -> Decimal {
        round_money(window.duration_hours() * self.half_hourly_rate * Decimal::TWO)
    }

    /// Toggle "available now"; only approved partners may switch it on
    pub fn set_available_now(
        &mut self,
        available: bool,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if available && !self.is_approved() {
            return Err(DomainError::PartnerNotApproved);
        }
        self.is_available_now = available;
        self.available_now_since = available.then_some(now);
        self.updated_at = now;
        Ok(())
    }

    /// True once the availability flag has been up longer than `window`
    pub fn availability_lapsed(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.is_available_now
            && self
                .available_now_since
                .is_some_and(|since| since < now - window)
    }

    /// Candidate referral code: the first eight ID characters plus four digits
    pub fn referral_code_candidate(&self) -> String {
        let prefix: String = self
            .id
            .to_string()
            .chars()
            .take(8)
            .collect::<String>()
            .to_uppercase();
        let suffix = rand::thread_rng().gen_range(1000..=9999);
        format!("{prefix}{suffix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn partner(rate: i64) -> Partner {
        Partner::new(
            Snowflake::new(1_234_567_890_123),
            Snowflake::new(2),
            "Mika".to_string(),
            vec!["valorant".to_string()],
            Decimal::from(rate),
        )
    }

    #[test]
    fn test_price_is_two_half_hours_per_hour() {
        let p = partner(150);
        let start = Utc.with_ymd_and_hms(2025, 5, 1, 20, 0, 0).unwrap();
        let window = TimeRange::new(start, start + Duration::minutes(90)).unwrap();
        assert_eq!(p.price_for(&window), Decimal::from(450));
    }

    #[test]
    fn test_pending_partner_cannot_go_available() {
        let mut p = partner(100);
        let err = p.set_available_now(true, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::PartnerNotApproved));
        // switching off is always allowed
        assert!(p.set_available_now(false, Utc::now()).is_ok());
    }

    #[test]
    fn test_availability_stamp() {
        let mut p = partner(100);
        p.status = PartnerStatus::Approved;
        let now = Utc::now();
        p.set_available_now(true, now).unwrap();
        assert_eq!(p.available_now_since, Some(now));

        assert!(!p.availability_lapsed(now + Duration::minutes(29), Duration::minutes(30)));
        assert!(p.availability_lapsed(now + Duration::minutes(31), Duration::minutes(30)));

        p.set_available_now(false, now).unwrap();
        assert!(p.available_now_since.is_none());
    }

    #[test]
    fn test_referral_code_shape() {
        let code = partner(100).referral_code_candidate();
        assert_eq!(code.len(), 12);
        assert!(code.starts_with("12345678"));
        let suffix: u32 = code[8..].parse().unwrap();
        assert!((1000..=9999).contains(&suffix));
    }
}

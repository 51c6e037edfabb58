//! Promo code entity and discount calculation

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::{round_money, Snowflake};

/// Sentinel for "no usage limit"
pub const UNLIMITED_USES: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

impl DiscountType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Percentage => "PERCENTAGE",
            Self::Fixed => "FIXED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PERCENTAGE" => Some(Self::Percentage),
            "FIXED" => Some(Self::Fixed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromoCode {
    pub id: Snowflake,
    pub code: String,
    pub discount_type: DiscountType,
    pub value: Decimal,
    pub max_uses: i32,
    pub used_count: i32,
    pub valid_from: DateTime<Utc>,
    pub valid_until: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub partner_id: Option<Snowflake>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Discount applied to a single amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PromoDiscount {
    pub original_amount: Decimal,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
}

impl PromoCode {
    /// Codes are matched case-insensitively and stored upper-case
    pub fn normalize(code: &str) -> String {
        code.trim().to_uppercase()
    }

    pub fn new(
        id: Snowflake,
        code: &str,
        discount_type: DiscountType,
        value: Decimal,
        valid_from: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            code: Self::normalize(code),
            discount_type,
            value,
            max_uses: UNLIMITED_USES,
            used_count: 0,
            valid_from,
            valid_until: None,
            is_active: true,
            partner_id: None,
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.max_uses != UNLIMITED_USES && self.used_count >= self.max_uses
    }

    /// Checks run in a fixed order so callers see the first failing rule
    pub fn check_usable(
        &self,
        partner_id: Option<Snowflake>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if !self.is_active {
            return Err(DomainError::PromoCodeInactive);
        }
        if let Some(bound) = self.partner_id {
            if partner_id != Some(bound) {
                return Err(DomainError::PromoCodePartnerMismatch);
            }
        }
        if self.is_exhausted() {
            return Err(DomainError::PromoCodeExhausted);
        }
        if self.valid_from > now {
            return Err(DomainError::PromoCodeNotYetValid);
        }
        if self.valid_until.is_some_and(|until| until < now) {
            return Err(DomainError::PromoCodeExpired);
        }
        Ok(())
    }

    pub fn discount_for(&self, amount: Decimal) -> PromoDiscount {
        let discount = match self.discount_type {
            DiscountType::Percentage => amount * self.value / Decimal::ONE_HUNDRED,
            DiscountType::Fixed => self.value.min(amount),
        };
        PromoDiscount {
            original_amount: amount,
            discount_amount: round_money(discount),
            final_amount: round_money(amount - discount),
        }
    }

    /// `check_usable` followed by `discount_for`
    pub fn apply(
        &self,
        amount: Decimal,
        partner_id: Option<Snowflake>,
        now: DateTime<Utc>,
    ) -> Result<PromoDiscount, DomainError> {
        self.check_usable(partner_id, now)?;
        Ok(self.discount_for(amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal::prelude::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn code(kind: DiscountType, value: &str) -> PromoCode {
        PromoCode::new(
            Snowflake::new(1),
            " welcome10 ",
            kind,
            dec(value),
            Utc::now() - Duration::days(1),
        )
    }

    #[test]
    fn test_code_is_normalized() {
        assert_eq!(code(DiscountType::Fixed, "1").code, "WELCOME10");
    }

    #[test]
    fn test_percentage_discount_rounds() {
        let d = code(DiscountType::Percentage, "15").discount_for(dec("333.33"));
        assert_eq!(d.discount_amount, dec("50.00"));
        assert_eq!(d.final_amount, dec("283.33"));
    }

    #[test]
    fn test_fixed_discount_capped_at_amount() {
        let d = code(DiscountType::Fixed, "500").discount_for(dec("300"));
        assert_eq!(d.discount_amount, dec("300"));
        assert_eq!(d.final_amount, Decimal::ZERO);
    }

    #[test]
    fn test_rule_order() {
        let now = Utc::now();
        let mut p = code(DiscountType::Fixed, "50");
        p.is_active = false;
        p.max_uses = 1;
        p.used_count = 1;
        assert!(matches!(p.check_usable(None, now), Err(DomainError::PromoCodeInactive)));

        p.is_active = true;
        assert!(matches!(p.check_usable(None, now), Err(DomainError::PromoCodeExhausted)));

        p.max_uses = UNLIMITED_USES;
        p.valid_until = Some(now - Duration::hours(1));
        assert!(matches!(p.check_usable(None, now), Err(DomainError::PromoCodeExpired)));

        p.valid_until = None;
        p.valid_from = now + Duration::hours(1);
        assert!(matches!(
            p.check_usable(None, now),
            Err(DomainError::PromoCodeNotYetValid)
        ));
    }

    #[test]
    fn test_partner_bound_code() {
        let now = Utc::now();
        let mut p = code(DiscountType::Fixed, "50");
        p.partner_id = Some(Snowflake::new(7));
        assert!(matches!(
            p.check_usable(None, now),
            Err(DomainError::PromoCodePartnerMismatch)
        ));
        assert!(matches!(
            p.check_usable(Some(Snowflake::new(8)), now),
            Err(DomainError::PromoCodePartnerMismatch)
        ));
        assert!(p.check_usable(Some(Snowflake::new(7)), now).is_ok());
    }
}

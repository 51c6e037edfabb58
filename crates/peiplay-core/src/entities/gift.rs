//! Gift catalogue, gift history, and partner coin earnings

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::value_objects::Snowflake;

#[derive(Debug, Clone, PartialEq)]
pub struct GiftItem {
    pub id: Snowflake,
    pub name: String,
    pub emoji: String,
    pub coin_cost: i64,
    /// Fraction of `coin_cost` credited to the partner, e.g. `0.7`
    pub partner_share: Decimal,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

impl GiftItem {
    /// Partner credit, rounded down to whole coins
    pub fn partner_coins(&self) -> i64 {
        (Decimal::from(self.coin_cost) * self.partner_share)
            .floor()
            .to_i64()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiftRecord {
    pub id: Snowflake,
    pub sender_id: Snowflake,
    pub partner_id: Snowflake,
    pub gift_id: Snowflake,
    pub gift_name: String,
    pub gift_emoji: String,
    pub coin_cost: i64,
    pub partner_coins: i64,
    pub chat_room_id: Option<Snowflake>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerEarnings {
    pub partner_id: Snowflake,
    pub total_earned_coins: i64,
    pub pending_earnings_coins: i64,
    pub updated_at: DateTime<Utc>,
}

impl PartnerEarnings {
    pub fn empty(partner_id: Snowflake) -> Self {
        Self {
            partner_id,
            total_earned_coins: 0,
            pending_earnings_coins: 0,
            updated_at: Utc::now(),
        }
    }
}

/// Everything needed to record one gift inside a single transaction
#[derive(Debug, Clone)]
pub struct GiftSend {
    pub record_id: Snowflake,
    pub transaction_id: Snowflake,
    pub sender_id: Snowflake,
    pub partner_id: Snowflake,
    pub gift: GiftItem,
    pub chat_room_id: Option<Snowflake>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gift(cost: i64, share: Decimal) -> GiftItem {
        GiftItem {
            id: Snowflake::new(1),
            name: "Rose".to_string(),
            emoji: "🌹".to_string(),
            coin_cost: cost,
            partner_share: share,
            is_active: true,
            sort_order: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_partner_coins_floor() {
        assert_eq!(gift(10, Decimal::new(7, 1)).partner_coins(), 7);
        assert_eq!(gift(15, Decimal::new(7, 1)).partner_coins(), 10);
        assert_eq!(gift(1, Decimal::new(7, 1)).partner_coins(), 0);
    }
}

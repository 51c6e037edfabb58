//! Gift catalogue, gift history, and partner earnings models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct GiftItemModel {
    pub id: i64,
    pub name: String,
    pub emoji: String,
    pub coin_cost: i64,
    pub partner_share: Decimal,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct GiftRecordModel {
    pub id: i64,
    pub sender_id: i64,
    pub partner_id: i64,
    pub gift_id: i64,
    pub gift_name: String,
    pub gift_emoji: String,
    pub coin_cost: i64,
    pub partner_coins: i64,
    pub chat_room_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct PartnerEarningsModel {
    pub partner_id: i64,
    pub total_earned_coins: i64,
    pub pending_earnings_coins: i64,
    pub updated_at: DateTime<Utc>,
}

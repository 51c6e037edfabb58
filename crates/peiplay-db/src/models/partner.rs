//! Partner database model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct PartnerModel {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub games: Vec<String>,
    pub half_hourly_rate: Decimal,
    pub status: String,
    pub customer_message: Option<String>,
    pub is_available_now: bool,
    pub available_now_since: Option<DateTime<Utc>>,
    pub invite_code: Option<String>,
    pub invited_by: Option<i64>,
    pub referral_count: i32,
    pub referral_earnings: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

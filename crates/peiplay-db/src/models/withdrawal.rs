//! Withdrawal request model and earnings aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct WithdrawalModel {
    pub id: i64,
    pub partner_id: i64,
    pub amount: Decimal,
    pub status: String,
    pub admin_note: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

/// Row of the earnings aggregate query
#[derive(Debug, Clone, FromRow)]
pub struct EarningsSummaryModel {
    pub booking_total: Decimal,
    pub referral_earnings: Decimal,
    pub withdrawn_total: Decimal,
}

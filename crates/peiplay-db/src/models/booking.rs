//! Booking and payment database models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// A booking row joined with its schedule, partner, and customer
#[derive(Debug, Clone, FromRow)]
pub struct BookingModel {
    pub id: i64,
    pub customer_id: i64,
    pub customer_user_id: i64,
    pub schedule_id: i64,
    pub partner_id: i64,
    pub partner_user_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub original_amount: Decimal,
    pub final_amount: Decimal,
    pub promo_code_id: Option<i64>,
    pub order_number: Option<String>,
    pub is_instant: bool,
    pub reject_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct PaymentModel {
    pub id: i64,
    pub booking_id: i64,
    pub provider: String,
    pub idempotency_key: String,
    pub amount_cents: i64,
    pub currency: String,
    pub status: String,
    pub raw: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

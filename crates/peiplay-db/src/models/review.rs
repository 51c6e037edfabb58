//! Review models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct ReviewModel {
    pub id: i64,
    pub booking_id: i64,
    pub reviewer_id: i64,
    pub reviewee_id: i64,
    pub rating: i16,
    pub comment: Option<String>,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct RatingSummaryModel {
    pub average: Option<Decimal>,
    pub count: i64,
}

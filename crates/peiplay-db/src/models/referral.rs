//! Referral models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct ReferralRecordModel {
    pub id: i64,
    pub inviter_id: i64,
    pub invitee_id: i64,
    pub invite_code: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ReferralInviteeModel {
    pub partner_id: i64,
    pub name: String,
    pub joined_at: DateTime<Utc>,
    pub earned: Decimal,
}

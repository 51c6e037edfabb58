//! User and customer database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for users table
#[derive(Debug, Clone, FromRow)]
pub struct UserModel {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: String,
    pub email_verified: bool,
    pub is_suspended: bool,
    pub suspension_reason: Option<String>,
    pub suspension_ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CustomerModel {
    pub id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

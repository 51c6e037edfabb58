//! Coin wallet, ledger, and recharge models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct UserCoinsModel {
    pub user_id: i64,
    pub coin_balance: i64,
    pub total_recharged: i64,
    pub total_spent: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CoinTransactionModel {
    pub id: i64,
    pub user_id: i64,
    pub transaction_type: String,
    pub amount: i64,
    pub description: Option<String>,
    pub order_id: Option<String>,
    pub balance_before: i64,
    pub balance_after: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct RechargeRecordModel {
    pub id: i64,
    pub user_id: i64,
    pub order_number: String,
    pub coin_amount: i64,
    pub payment_amount: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

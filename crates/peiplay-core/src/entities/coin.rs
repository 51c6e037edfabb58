//! Coin wallet, ledger entries, and recharge orders

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Upper bound for a single recharge order
pub const MAX_RECHARGE_COINS: i64 = 100_000;

/// Per-user wallet; the balance is never negative
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCoins {
    pub user_id: Snowflake,
    pub coin_balance: i64,
    pub total_recharged: i64,
    pub total_spent: i64,
    pub updated_at: DateTime<Utc>,
}

impl UserCoins {
    pub fn empty(user_id: Snowflake) -> Self {
        Self {
            user_id,
            coin_balance: 0,
            total_recharged: 0,
            total_spent: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn ensure_can_spend(&self, amount: i64) -> Result<(), DomainError> {
        if amount > self.coin_balance {
            return Err(DomainError::InsufficientCoins {
                balance: self.coin_balance,
                required: amount,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoinTransactionType {
    Recharge,
    Gift,
    AdminAdjustment,
    Refund,
}

impl CoinTransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Recharge => "RECHARGE",
            Self::Gift => "GIFT",
            Self::AdminAdjustment => "ADMIN_ADJUSTMENT",
            Self::Refund => "REFUND",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "RECHARGE" => Some(Self::Recharge),
            "GIFT" => Some(Self::Gift),
            "ADMIN_ADJUSTMENT" => Some(Self::AdminAdjustment),
            "REFUND" => Some(Self::Refund),
            _ => None,
        }
    }
}

/// Ledger entry; `amount` is signed (debits are negative)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinTransaction {
    pub id: Snowflake,
    pub user_id: Snowflake,
    pub transaction_type: CoinTransactionType,
    pub amount: i64,
    pub description: Option<String>,
    pub order_id: Option<String>,
    pub balance_before: i64,
    pub balance_after: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RechargeStatus {
    Pending,
    Completed,
    Failed,
}

impl RechargeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "COMPLETED" => Some(Self::Completed),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RechargeRecord {
    pub id: Snowflake,
    pub user_id: Snowflake,
    pub order_number: String,
    pub coin_amount: i64,
    pub payment_amount: Decimal,
    pub status: RechargeStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl RechargeRecord {
    /// One coin costs one TWD
    pub fn new(id: Snowflake, user_id: Snowflake, coin_amount: i64, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            order_number: recharge_order_number(now),
            coin_amount,
            payment_amount: Decimal::from(coin_amount),
            status: RechargeStatus::Pending,
            created_at: now,
            completed_at: None,
        }
    }
}

/// `RECHARGE-{unix_ms}-{random}`
pub fn recharge_order_number(now: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(9)
        .map(|c| char::from(c).to_ascii_uppercase())
        .collect();
    format!("RECHARGE-{}-{suffix}", now.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spend_guard() {
        let mut wallet = UserCoins::empty(Snowflake::new(1));
        wallet.coin_balance = 30;
        assert!(wallet.ensure_can_spend(30).is_ok());
        assert!(matches!(
            wallet.ensure_can_spend(31),
            Err(DomainError::InsufficientCoins {
                balance: 30,
                required: 31
            })
        ));
    }

    #[test]
    fn test_recharge_price_is_one_twd_per_coin() {
        let r = RechargeRecord::new(Snowflake::new(1), Snowflake::new(2), 250, Utc::now());
        assert_eq!(r.payment_amount, Decimal::from(250));
        assert_eq!(r.status, RechargeStatus::Pending);
        assert!(r.order_number.starts_with("RECHARGE-"));
    }

    #[test]
    fn test_transaction_type_strings() {
        for t in [
            CoinTransactionType::Recharge,
            CoinTransactionType::Gift,
            CoinTransactionType::AdminAdjustment,
            CoinTransactionType::Refund,
        ] {
            assert_eq!(CoinTransactionType::parse(t.as_str()), Some(t));
        }
    }
}

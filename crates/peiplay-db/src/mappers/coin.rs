//! Coin mappers

use peiplay_core::{
    CoinTransaction, CoinTransactionType, DomainError, RechargeRecord, RechargeStatus, Snowflake,
    UserCoins,
};

use super::parse_column;
use crate::models::{CoinTransactionModel, RechargeRecordModel, UserCoinsModel};

impl From<UserCoinsModel> for UserCoins {
    fn from(model: UserCoinsModel) -> Self {
        UserCoins {
            user_id: Snowflake::new(model.user_id),
            coin_balance: model.coin_balance,
            total_recharged: model.total_recharged,
            total_spent: model.total_spent,
            updated_at: model.updated_at,
        }
    }
}

impl TryFrom<CoinTransactionModel> for CoinTransaction {
    type Error = DomainError;

    fn try_from(model: CoinTransactionModel) -> Result<Self, Self::Error> {
        Ok(CoinTransaction {
            id: Snowflake::new(model.id),
            user_id: Snowflake::new(model.user_id),
            transaction_type: parse_column(
                &model.transaction_type,
                "coin_transactions.transaction_type",
                CoinTransactionType::parse,
            )?,
            amount: model.amount,
            description: model.description,
            order_id: model.order_id,
            balance_before: model.balance_before,
            balance_after: model.balance_after,
            created_at: model.created_at,
        })
    }
}

impl TryFrom<RechargeRecordModel> for RechargeRecord {
    type Error = DomainError;

    fn try_from(model: RechargeRecordModel) -> Result<Self, Self::Error> {
        Ok(RechargeRecord {
            id: Snowflake::new(model.id),
            user_id: Snowflake::new(model.user_id),
            order_number: model.order_number,
            coin_amount: model.coin_amount,
            payment_amount: model.payment_amount,
            status: parse_column(&model.status, "recharge_records.status", RechargeStatus::parse)?,
            created_at: model.created_at,
            completed_at: model.completed_at,
        })
    }
}

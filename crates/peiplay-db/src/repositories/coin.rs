//! PostgreSQL implementation of CoinRepository
//!
//! Every balance change is a single conditional `UPDATE ... RETURNING` so the
//! ledger's `balance_before`/`balance_after` come from the row that was
//! actually written. The `coin_balance >= 0` CHECK is the last line of defence.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use peiplay_core::entities::{CoinTransaction, CoinTransactionType, RechargeRecord, UserCoins};
use peiplay_core::error::DomainError;
use peiplay_core::traits::{CoinRepository, RepoResult};
use peiplay_core::value_objects::Snowflake;

use crate::mappers::map_all;
use crate::models::{CoinTransactionModel, RechargeRecordModel, UserCoinsModel};
use crate::resilience::DbResilience;

use super::error::{is_check_violation, map_db_error};

const COIN_TX_COLUMNS: &str = r"
    id, user_id, transaction_type, amount, description, order_id, balance_before,
    balance_after, created_at
";

const RECHARGE_COLUMNS: &str = r"
    id, user_id, order_number, coin_amount, payment_amount, status, created_at, completed_at
";

/// One ledger entry to write alongside a balance change
pub(crate) struct LedgerEntry<'a> {
    pub id: Snowflake,
    pub user_id: Snowflake,
    pub kind: CoinTransactionType,
    pub amount: i64,
    pub description: Option<&'a str>,
    pub order_id: Option<&'a str>,
}

async fn insert_ledger(
    conn: &mut PgConnection,
    entry: &LedgerEntry<'_>,
    balance_before: i64,
    balance_after: i64,
) -> RepoResult<CoinTransaction> {
    let sql = format!(
        r"
        INSERT INTO coin_transactions (id, user_id, transaction_type, amount, description,
                                       order_id, balance_before, balance_after)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {COIN_TX_COLUMNS}
        "
    );
    let row = sqlx::query_as::<_, CoinTransactionModel>(&sql)
        .bind(entry.id.into_inner())
        .bind(entry.user_id.into_inner())
        .bind(entry.kind.as_str())
        .bind(entry.amount)
        .bind(entry.description)
        .bind(entry.order_id)
        .bind(balance_before)
        .bind(balance_after)
        .fetch_one(conn)
        .await
        .map_err(map_db_error)?;
    CoinTransaction::try_from(row)
}

/// Add coins, creating the wallet if needed
pub(crate) async fn credit_in_tx(
    conn: &mut PgConnection,
    entry: &LedgerEntry<'_>,
) -> RepoResult<CoinTransaction> {
    let balance_after = sqlx::query_scalar::<_, i64>(
        r"
        INSERT INTO user_coins (user_id, coin_balance, total_recharged)
        VALUES ($1, $2, $2)
        ON CONFLICT (user_id) DO UPDATE
        SET coin_balance = user_coins.coin_balance + EXCLUDED.coin_balance,
            total_recharged = user_coins.total_recharged + EXCLUDED.total_recharged,
            updated_at = NOW()
        RETURNING coin_balance
        ",
    )
    .bind(entry.user_id.into_inner())
    .bind(entry.amount)
    .fetch_one(&mut *conn)
    .await
    .map_err(map_db_error)?;

    insert_ledger(conn, entry, balance_after - entry.amount, balance_after).await
}

/// Remove coins only if the balance covers them
pub(crate) async fn debit_in_tx(
    conn: &mut PgConnection,
    entry: &LedgerEntry<'_>,
) -> RepoResult<CoinTransaction> {
    let insufficient = |balance: i64| DomainError::InsufficientCoins {
        balance,
        required: entry.amount,
    };

    let updated = sqlx::query_scalar::<_, i64>(
        r"
        UPDATE user_coins
        SET coin_balance = coin_balance - $2, total_spent = total_spent + $2, updated_at = NOW()
        WHERE user_id = $1 AND coin_balance >= $2
        RETURNING coin_balance
        ",
    )
    .bind(entry.user_id.into_inner())
    .bind(entry.amount)
    .fetch_optional(&mut *conn)
    .await;

    let balance_after = match updated {
        Ok(Some(balance)) => balance,
        Ok(None) => {
            let balance = sqlx::query_scalar::<_, i64>(
                "SELECT coin_balance FROM user_coins WHERE user_id = $1",
            )
            .bind(entry.user_id.into_inner())
            .fetch_optional(&mut *conn)
            .await
            .map_err(map_db_error)?
            .unwrap_or(0);
            return Err(insufficient(balance));
        }
        Err(e) if is_check_violation(&e) => return Err(insufficient(0)),
        Err(e) => return Err(map_db_error(e)),
    };

    insert_ledger(conn, entry, balance_after + entry.amount, balance_after).await
}

#[derive(Clone)]
pub struct PgCoinRepository {
    pool: PgPool,
    resilience: Arc<DbResilience>,
}

impl PgCoinRepository {
    pub fn new(pool: PgPool, resilience: Arc<DbResilience>) -> Self {
        Self { pool, resilience }
    }

    async fn complete_recharge_in_tx(
        &self,
        order_number: &str,
        transaction_id: Snowflake,
    ) -> RepoResult<Option<CoinTransaction>> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let claimed = sqlx::query_as::<_, (i64, i64)>(
            r"
            UPDATE recharge_records SET status = 'COMPLETED', completed_at = NOW()
            WHERE order_number = $1 AND status = 'PENDING'
            RETURNING user_id, coin_amount
            ",
        )
        .bind(order_number)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_error)?;

        let Some((user_id, coin_amount)) = claimed else {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM recharge_records WHERE order_number = $1)",
            )
            .bind(order_number)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_error)?;
            if !exists {
                return Err(DomainError::RechargeNotFound(order_number.to_string()));
            }
            return Ok(None);
        };

        let entry = LedgerEntry {
            id: transaction_id,
            user_id: Snowflake::new(user_id),
            kind: CoinTransactionType::Recharge,
            amount: coin_amount,
            description: Some("Coin recharge"),
            order_id: Some(order_number),
        };
        let transaction = credit_in_tx(&mut tx, &entry).await?;

        tx.commit().await.map_err(map_db_error)?;
        Ok(Some(transaction))
    }

    async fn credit_standalone(&self, entry: &LedgerEntry<'_>) -> RepoResult<CoinTransaction> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        let transaction = credit_in_tx(&mut tx, entry).await?;
        tx.commit().await.map_err(map_db_error)?;
        Ok(transaction)
    }
}

#[async_trait]
impl CoinRepository for PgCoinRepository {
    #[instrument(skip(self))]
    async fn get_or_create(&self, user_id: Snowflake) -> RepoResult<UserCoins> {
        let pool = &self.pool;
        let row = self
            .resilience
            .run("coin.get_or_create", || async move {
                sqlx::query_as::<_, UserCoinsModel>(
                    r"
                    INSERT INTO user_coins (user_id) VALUES ($1)
                    ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
                    RETURNING user_id, coin_balance, total_recharged, total_spent, updated_at
                    ",
                )
                .bind(user_id.into_inner())
                .fetch_one(pool)
                .await
                .map_err(map_db_error)
            })
            .await?;

        Ok(UserCoins::from(row))
    }

    #[instrument(skip(self))]
    async fn transactions(
        &self,
        user_id: Snowflake,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<CoinTransaction>> {
        let pool = &self.pool;
        let sql = format!(
            r"
            SELECT {COIN_TX_COLUMNS}
            FROM coin_transactions
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "
        );
        let sql = sql.as_str();
        let rows = self
            .resilience
            .run("coin.transactions", || async move {
                sqlx::query_as::<_, CoinTransactionModel>(sql)
                    .bind(user_id.into_inner())
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        map_all(rows)
    }

    #[instrument(skip(self))]
    async fn count_transactions(&self, user_id: Snowflake) -> RepoResult<i64> {
        let pool = &self.pool;
        self.resilience
            .run("coin.count_transactions", || async move {
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM coin_transactions WHERE user_id = $1",
                )
                .bind(user_id.into_inner())
                .fetch_one(pool)
                .await
                .map_err(map_db_error)
            })
            .await
    }

    #[instrument(skip(self, record), fields(order_number = %record.order_number))]
    async fn create_recharge(&self, record: &RechargeRecord) -> RepoResult<()> {
        self.resilience
            .guard("coin.create_recharge", async {
                sqlx::query(
                    r"
                    INSERT INTO recharge_records (id, user_id, order_number, coin_amount,
                                                  payment_amount, status, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    ",
                )
                .bind(record.id.into_inner())
                .bind(record.user_id.into_inner())
                .bind(&record.order_number)
                .bind(record.coin_amount)
                .bind(record.payment_amount)
                .bind(record.status.as_str())
                .bind(record.created_at)
                .execute(&self.pool)
                .await
                .map_err(map_db_error)?;
                Ok(())
            })
            .await
    }

    #[instrument(skip(self))]
    async fn find_recharge(&self, order_number: &str) -> RepoResult<Option<RechargeRecord>> {
        let pool = &self.pool;
        let sql = format!("SELECT {RECHARGE_COLUMNS} FROM recharge_records WHERE order_number = $1");
        let sql = sql.as_str();
        let row = self
            .resilience
            .run("coin.find_recharge", || async move {
                sqlx::query_as::<_, RechargeRecordModel>(sql)
                    .bind(order_number)
                    .fetch_optional(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        row.map(RechargeRecord::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn complete_recharge(
        &self,
        order_number: &str,
        transaction_id: Snowflake,
    ) -> RepoResult<Option<CoinTransaction>> {
        self.resilience
            .guard(
                "coin.complete_recharge",
                self.complete_recharge_in_tx(order_number, transaction_id),
            )
            .await
    }

    #[instrument(skip(self))]
    async fn credit(
        &self,
        user_id: Snowflake,
        amount: i64,
        kind: CoinTransactionType,
        description: Option<&str>,
        transaction_id: Snowflake,
    ) -> RepoResult<CoinTransaction> {
        if amount <= 0 {
            return Err(DomainError::ValidationError(
                "credit amount must be positive".to_string(),
            ));
        }
        let entry = LedgerEntry {
            id: transaction_id,
            user_id,
            kind,
            amount,
            description,
            order_id: None,
        };
        self.resilience
            .guard("coin.credit", self.credit_standalone(&entry))
            .await
    }
}

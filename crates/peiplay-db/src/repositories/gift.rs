//! PostgreSQL implementation of GiftRepository

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use peiplay_core::entities::{
    CoinTransaction, CoinTransactionType, GiftItem, GiftRecord, GiftSend, PartnerEarnings,
};
use peiplay_core::traits::{GiftRepository, RepoResult};
use peiplay_core::value_objects::Snowflake;

use crate::models::{GiftItemModel, GiftRecordModel, PartnerEarningsModel};
use crate::resilience::DbResilience;

use super::coin::{debit_in_tx, LedgerEntry};
use super::error::map_db_error;

const GIFT_COLUMNS: &str =
    "id, name, emoji, coin_cost, partner_share, is_active, sort_order, created_at";

const GIFT_RECORD_COLUMNS: &str = r"
    id, sender_id, partner_id, gift_id, gift_name, gift_emoji, coin_cost, partner_coins,
    chat_room_id, created_at
";

#[derive(Clone)]
pub struct PgGiftRepository {
    pool: PgPool,
    resilience: Arc<DbResilience>,
}

impl PgGiftRepository {
    pub fn new(pool: PgPool, resilience: Arc<DbResilience>) -> Self {
        Self { pool, resilience }
    }

    async fn send_in_tx(&self, gift: &GiftSend) -> RepoResult<(GiftRecord, CoinTransaction)> {
        let partner_coins = gift.gift.partner_coins();
        let description = format!("Gift {} {}", gift.gift.emoji, gift.gift.name);

        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let entry = LedgerEntry {
            id: gift.transaction_id,
            user_id: gift.sender_id,
            kind: CoinTransactionType::Gift,
            amount: gift.gift.coin_cost,
            description: Some(&description),
            order_id: None,
        };
        let transaction = debit_in_tx(&mut tx, &entry).await?;

        sqlx::query(
            r"
            INSERT INTO partner_earnings (partner_id, total_earned_coins, pending_earnings_coins)
            VALUES ($1, $2, $2)
            ON CONFLICT (partner_id) DO UPDATE
            SET total_earned_coins = partner_earnings.total_earned_coins + EXCLUDED.total_earned_coins,
                pending_earnings_coins =
                    partner_earnings.pending_earnings_coins + EXCLUDED.pending_earnings_coins,
                updated_at = NOW()
            ",
        )
        .bind(gift.partner_id.into_inner())
        .bind(partner_coins)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        let sql = format!(
            r"
            INSERT INTO gift_records (id, sender_id, partner_id, gift_id, gift_name, gift_emoji,
                                      coin_cost, partner_coins, chat_room_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {GIFT_RECORD_COLUMNS}
            "
        );
        let record = sqlx::query_as::<_, GiftRecordModel>(&sql)
            .bind(gift.record_id.into_inner())
            .bind(gift.sender_id.into_inner())
            .bind(gift.partner_id.into_inner())
            .bind(gift.gift.id.into_inner())
            .bind(&gift.gift.name)
            .bind(&gift.gift.emoji)
            .bind(gift.gift.coin_cost)
            .bind(partner_coins)
            .bind(gift.chat_room_id.map(Snowflake::into_inner))
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;
        Ok((GiftRecord::from(record), transaction))
    }
}

#[async_trait]
impl GiftRepository for PgGiftRepository {
    #[instrument(skip(self))]
    async fn list_active(&self) -> RepoResult<Vec<GiftItem>> {
        let pool = &self.pool;
        let sql = format!(
            "SELECT {GIFT_COLUMNS} FROM gift_items WHERE is_active ORDER BY sort_order, id"
        );
        let sql = sql.as_str();
        let rows = self
            .resilience
            .run("gift.list_active", || async move {
                sqlx::query_as::<_, GiftItemModel>(sql)
                    .fetch_all(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        Ok(rows.into_iter().map(GiftItem::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<GiftItem>> {
        let pool = &self.pool;
        let sql = format!("SELECT {GIFT_COLUMNS} FROM gift_items WHERE id = $1");
        let sql = sql.as_str();
        let row = self
            .resilience
            .run("gift.find_by_id", || async move {
                sqlx::query_as::<_, GiftItemModel>(sql)
                    .bind(id.into_inner())
                    .fetch_optional(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        Ok(row.map(GiftItem::from))
    }

    #[instrument(skip(self, gift), fields(sender_id = %gift.sender_id, partner_id = %gift.partner_id, gift_id = %gift.gift.id))]
    async fn send(&self, gift: &GiftSend) -> RepoResult<(GiftRecord, CoinTransaction)> {
        self.resilience
            .guard("gift.send", self.send_in_tx(gift))
            .await
    }

    #[instrument(skip(self))]
    async fn received_by_partner(
        &self,
        partner_id: Snowflake,
        limit: i64,
    ) -> RepoResult<Vec<GiftRecord>> {
        let pool = &self.pool;
        let sql = format!(
            r"
            SELECT {GIFT_RECORD_COLUMNS}
            FROM gift_records
            WHERE partner_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "
        );
        let sql = sql.as_str();
        let rows = self
            .resilience
            .run("gift.received_by_partner", || async move {
                sqlx::query_as::<_, GiftRecordModel>(sql)
                    .bind(partner_id.into_inner())
                    .bind(limit)
                    .fetch_all(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        Ok(rows.into_iter().map(GiftRecord::from).collect())
    }

    #[instrument(skip(self))]
    async fn earnings(&self, partner_id: Snowflake) -> RepoResult<PartnerEarnings> {
        let pool = &self.pool;
        let row = self
            .resilience
            .run("gift.earnings", || async move {
                sqlx::query_as::<_, PartnerEarningsModel>(
                    r"
                    SELECT partner_id, total_earned_coins, pending_earnings_coins, updated_at
                    FROM partner_earnings
                    WHERE partner_id = $1
                    ",
                )
                .bind(partner_id.into_inner())
                .fetch_optional(pool)
                .await
                .map_err(map_db_error)
            })
            .await?;

        Ok(row.map_or_else(|| PartnerEarnings::empty(partner_id), PartnerEarnings::from))
    }
}

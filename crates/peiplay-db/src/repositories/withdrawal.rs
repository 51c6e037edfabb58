//! PostgreSQL implementation of WithdrawalRepository

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use peiplay_core::entities::{
    EarningsSummary, WithdrawalBalance, WithdrawalRequest, WithdrawalStatus,
};
use peiplay_core::error::DomainError;
use peiplay_core::traits::{RepoResult, WithdrawalRepository};
use peiplay_core::value_objects::Snowflake;

use crate::mappers::map_all;
use crate::models::{EarningsSummaryModel, WithdrawalModel};
use crate::resilience::DbResilience;

use super::error::{map_db_error, map_unique_violation};

const WITHDRAWAL_COLUMNS: &str =
    "id, partner_id, amount, status, admin_note, requested_at, processed_at";

/// Booking revenue, referral income, and paid-out withdrawals for `$1`
const EARNINGS_SQL: &str = r"
    SELECT
        COALESCE((
            SELECT SUM(b.final_amount)
            FROM bookings b
            JOIN schedules s ON s.id = b.schedule_id
            WHERE s.partner_id = $1 AND b.status IN ('COMPLETED', 'CONFIRMED')
        ), 0) AS booking_total,
        COALESCE((SELECT referral_earnings FROM partners WHERE id = $1), 0) AS referral_earnings,
        COALESCE((
            SELECT SUM(amount)
            FROM withdrawal_requests
            WHERE partner_id = $1 AND status IN ('APPROVED', 'COMPLETED')
        ), 0) AS withdrawn_total
";

async fn summary_on(conn: &mut PgConnection, partner_id: Snowflake) -> RepoResult<EarningsSummary> {
    sqlx::query_as::<_, EarningsSummaryModel>(EARNINGS_SQL)
        .bind(partner_id.into_inner())
        .fetch_one(conn)
        .await
        .map(EarningsSummary::from)
        .map_err(map_db_error)
}

#[derive(Clone)]
pub struct PgWithdrawalRepository {
    pool: PgPool,
    resilience: Arc<DbResilience>,
}

impl PgWithdrawalRepository {
    pub fn new(pool: PgPool, resilience: Arc<DbResilience>) -> Self {
        Self { pool, resilience }
    }

    async fn create_in_tx(
        &self,
        request: &WithdrawalRequest,
        platform_fee_rate: Decimal,
    ) -> RepoResult<WithdrawalBalance> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        // Serialises concurrent requests from the same partner
        let locked = sqlx::query_scalar::<_, i64>("SELECT id FROM partners WHERE id = $1 FOR UPDATE")
            .bind(request.partner_id.into_inner())
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_db_error)?;
        if locked.is_none() {
            return Err(DomainError::PartnerNotFound);
        }

        let pending = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS(
                SELECT 1 FROM withdrawal_requests WHERE partner_id = $1 AND status = 'PENDING'
            )
            ",
        )
        .bind(request.partner_id.into_inner())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error)?;
        if pending {
            return Err(DomainError::PendingWithdrawalExists);
        }

        let summary = summary_on(&mut tx, request.partner_id).await?;
        let balance = WithdrawalBalance::compute(&summary, platform_fee_rate);
        balance.ensure_covers(request.amount)?;

        sqlx::query(
            r"
            INSERT INTO withdrawal_requests (id, partner_id, amount, status, requested_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(request.id.into_inner())
        .bind(request.partner_id.into_inner())
        .bind(request.amount)
        .bind(request.status.as_str())
        .bind(request.requested_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::PendingWithdrawalExists))?;

        tx.commit().await.map_err(map_db_error)?;
        Ok(balance)
    }
}

#[async_trait]
impl WithdrawalRepository for PgWithdrawalRepository {
    #[instrument(skip(self))]
    async fn earnings_summary(&self, partner_id: Snowflake) -> RepoResult<EarningsSummary> {
        let pool = &self.pool;
        self.resilience
            .run("withdrawal.earnings_summary", || async move {
                let mut conn = pool.acquire().await.map_err(map_db_error)?;
                summary_on(&mut conn, partner_id).await
            })
            .await
    }

    #[instrument(skip(self, request), fields(partner_id = %request.partner_id, amount = %request.amount))]
    async fn create_checked(
        &self,
        request: &WithdrawalRequest,
        platform_fee_rate: Decimal,
    ) -> RepoResult<WithdrawalBalance> {
        self.resilience
            .guard(
                "withdrawal.create_checked",
                self.create_in_tx(request, platform_fee_rate),
            )
            .await
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<WithdrawalRequest>> {
        let pool = &self.pool;
        let sql = format!("SELECT {WITHDRAWAL_COLUMNS} FROM withdrawal_requests WHERE id = $1");
        let sql = sql.as_str();
        let row = self
            .resilience
            .run("withdrawal.find_by_id", || async move {
                sqlx::query_as::<_, WithdrawalModel>(sql)
                    .bind(id.into_inner())
                    .fetch_optional(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        row.map(WithdrawalRequest::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn list_by_partner(&self, partner_id: Snowflake) -> RepoResult<Vec<WithdrawalRequest>> {
        let pool = &self.pool;
        let sql = format!(
            r"
            SELECT {WITHDRAWAL_COLUMNS}
            FROM withdrawal_requests
            WHERE partner_id = $1
            ORDER BY requested_at DESC
            "
        );
        let sql = sql.as_str();
        let rows = self
            .resilience
            .run("withdrawal.list_by_partner", || async move {
                sqlx::query_as::<_, WithdrawalModel>(sql)
                    .bind(partner_id.into_inner())
                    .fetch_all(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        map_all(rows)
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        status: Option<WithdrawalStatus>,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<WithdrawalRequest>> {
        let pool = &self.pool;
        let sql = format!(
            r"
            SELECT {WITHDRAWAL_COLUMNS}
            FROM withdrawal_requests
            WHERE ($1::TEXT IS NULL OR status = $1)
            ORDER BY requested_at DESC
            LIMIT $2 OFFSET $3
            "
        );
        let sql = sql.as_str();
        let status = status.map(WithdrawalStatus::as_str);
        let rows = self
            .resilience
            .run("withdrawal.list", || async move {
                sqlx::query_as::<_, WithdrawalModel>(sql)
                    .bind(status)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        map_all(rows)
    }

    #[instrument(skip(self, request), fields(withdrawal_id = %request.id))]
    async fn save_processed(
        &self,
        request: &WithdrawalRequest,
        expected: WithdrawalStatus,
    ) -> RepoResult<()> {
        let rows = self
            .resilience
            .guard("withdrawal.save_processed", async {
                sqlx::query(
                    r"
                    UPDATE withdrawal_requests
                    SET status = $2, admin_note = $3, processed_at = $4
                    WHERE id = $1 AND status = $5
                    ",
                )
                .bind(request.id.into_inner())
                .bind(request.status.as_str())
                .bind(&request.admin_note)
                .bind(request.processed_at)
                .bind(expected.as_str())
                .execute(&self.pool)
                .await
                .map(|r| r.rows_affected())
                .map_err(map_db_error)
            })
            .await?;

        if rows == 0 {
            return Err(DomainError::InvalidStatusTransition {
                from: expected.as_str().to_string(),
                to: request.status.as_str().to_string(),
            });
        }
        Ok(())
    }
}

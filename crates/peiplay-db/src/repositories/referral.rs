//! PostgreSQL implementation of ReferralRepository

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use peiplay_core::entities::{
    referral_commission, ReferralInvitee, ReferralOutcome, ReferralRecord,
};
use peiplay_core::error::DomainError;
use peiplay_core::traits::{ReferralRepository, RepoResult};
use peiplay_core::value_objects::Snowflake;

use crate::models::{ReferralInviteeModel, ReferralRecordModel};
use crate::resilience::DbResilience;

use super::error::{map_db_error, map_unique_violation};

#[derive(Clone)]
pub struct PgReferralRepository {
    pool: PgPool,
    resilience: Arc<DbResilience>,
}

impl PgReferralRepository {
    pub fn new(pool: PgPool, resilience: Arc<DbResilience>) -> Self {
        Self { pool, resilience }
    }

    async fn create_in_tx(&self, record: &ReferralRecord) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query(
            r"
            INSERT INTO referral_records (id, inviter_id, invitee_id, invite_code, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(record.id.into_inner())
        .bind(record.inviter_id.into_inner())
        .bind(record.invitee_id.into_inner())
        .bind(&record.invite_code)
        .bind(record.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::ReferralAlreadyApplied))?;

        sqlx::query(
            r"
            UPDATE partners SET invited_by = $2, updated_at = NOW()
            WHERE id = $1 AND invited_by IS NULL
            ",
        )
        .bind(record.invitee_id.into_inner())
        .bind(record.inviter_id.into_inner())
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        sqlx::query(
            r"
            UPDATE partners SET referral_count = referral_count + 1, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(record.inviter_id.into_inner())
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)
    }

    async fn calculate_in_tx(
        &self,
        booking_id: Snowflake,
        earning_id: Snowflake,
    ) -> RepoResult<ReferralOutcome> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        // (record id, inviter id, inviter referral_count, booking amount)
        let referral = sqlx::query_as::<_, (i64, i64, i32, Decimal)>(
            r"
            SELECT r.id, r.inviter_id, inviter.referral_count, b.final_amount
            FROM bookings b
            JOIN schedules s ON s.id = b.schedule_id
            JOIN referral_records r ON r.invitee_id = s.partner_id
            JOIN partners inviter ON inviter.id = r.inviter_id
            WHERE b.id = $1
            FOR UPDATE OF inviter
            ",
        )
        .bind(booking_id.into_inner())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_error)?;

        let Some((record_id, inviter_id, referral_count, amount)) = referral else {
            return Ok(ReferralOutcome::NoReferral);
        };
        if amount <= Decimal::ZERO {
            return Ok(ReferralOutcome::Skipped);
        }

        let (commission, percentage) = referral_commission(amount, referral_count);

        let inserted = sqlx::query(
            r"
            INSERT INTO referral_earnings (id, referral_record_id, booking_id, amount, percentage)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (booking_id) DO NOTHING
            ",
        )
        .bind(earning_id.into_inner())
        .bind(record_id)
        .bind(booking_id.into_inner())
        .bind(commission)
        .bind(percentage)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?
        .rows_affected();

        if inserted == 0 {
            return Ok(ReferralOutcome::AlreadyCalculated);
        }

        sqlx::query(
            r"
            UPDATE partners SET referral_earnings = referral_earnings + $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(inviter_id)
        .bind(commission)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;
        Ok(ReferralOutcome::Calculated {
            amount: commission,
            percentage,
        })
    }
}

#[async_trait]
impl ReferralRepository for PgReferralRepository {
    #[instrument(skip(self))]
    async fn find_by_invitee(&self, invitee_id: Snowflake) -> RepoResult<Option<ReferralRecord>> {
        let pool = &self.pool;
        let row = self
            .resilience
            .run("referral.find_by_invitee", || async move {
                sqlx::query_as::<_, ReferralRecordModel>(
                    r"
                    SELECT id, inviter_id, invitee_id, invite_code, created_at
                    FROM referral_records
                    WHERE invitee_id = $1
                    ",
                )
                .bind(invitee_id.into_inner())
                .fetch_optional(pool)
                .await
                .map_err(map_db_error)
            })
            .await?;

        Ok(row.map(ReferralRecord::from))
    }

    #[instrument(skip(self, record), fields(inviter_id = %record.inviter_id, invitee_id = %record.invitee_id))]
    async fn create(&self, record: &ReferralRecord) -> RepoResult<()> {
        if record.inviter_id == record.invitee_id {
            return Err(DomainError::OwnReferralCode);
        }
        self.resilience
            .guard("referral.create", self.create_in_tx(record))
            .await
    }

    #[instrument(skip(self))]
    async fn invitees(&self, inviter_id: Snowflake) -> RepoResult<Vec<ReferralInvitee>> {
        let pool = &self.pool;
        let rows = self
            .resilience
            .run("referral.invitees", || async move {
                sqlx::query_as::<_, ReferralInviteeModel>(
                    r"
                    SELECT p.id AS partner_id, p.name, r.created_at AS joined_at,
                           COALESCE(SUM(e.amount), 0) AS earned
                    FROM referral_records r
                    JOIN partners p ON p.id = r.invitee_id
                    LEFT JOIN referral_earnings e ON e.referral_record_id = r.id
                    WHERE r.inviter_id = $1
                    GROUP BY p.id, p.name, r.created_at
                    ORDER BY r.created_at DESC
                    ",
                )
                .bind(inviter_id.into_inner())
                .fetch_all(pool)
                .await
                .map_err(map_db_error)
            })
            .await?;

        Ok(rows.into_iter().map(ReferralInvitee::from).collect())
    }

    #[instrument(skip(self))]
    async fn calculate_for_booking(
        &self,
        booking_id: Snowflake,
        earning_id: Snowflake,
    ) -> RepoResult<ReferralOutcome> {
        self.resilience
            .guard(
                "referral.calculate_for_booking",
                self.calculate_in_tx(booking_id, earning_id),
            )
            .await
    }

    #[instrument(skip(self))]
    async fn bookings_pending_calculation(
        &self,
        since: DateTime<Utc>,
    ) -> RepoResult<Vec<Snowflake>> {
        let pool = &self.pool;
        let ids = self
            .resilience
            .run("referral.bookings_pending_calculation", || async move {
                sqlx::query_scalar::<_, i64>(
                    r"
                    SELECT b.id
                    FROM bookings b
                    JOIN schedules s ON s.id = b.schedule_id
                    JOIN referral_records r ON r.invitee_id = s.partner_id
                    WHERE b.status = 'COMPLETED'
                      AND b.updated_at >= $1
                      AND NOT EXISTS (SELECT 1 FROM referral_earnings e WHERE e.booking_id = b.id)
                    ORDER BY b.updated_at
                    ",
                )
                .bind(since)
                .fetch_all(pool)
                .await
                .map_err(map_db_error)
            })
            .await?;

        Ok(ids.into_iter().map(Snowflake::new).collect())
    }
}

//! PostgreSQL implementation of PartnerRepository

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use peiplay_core::entities::{Partner, PartnerStatus};
use peiplay_core::error::DomainError;
use peiplay_core::traits::{PartnerQuery, PartnerRepository, RepoResult};
use peiplay_core::value_objects::Snowflake;

use crate::mappers::map_all;
use crate::models::PartnerModel;
use crate::resilience::DbResilience;

use super::error::{map_db_error, map_unique_violation};
use super::PARTNER_COLUMNS;

#[derive(Clone)]
pub struct PgPartnerRepository {
    pool: PgPool,
    resilience: Arc<DbResilience>,
}

impl PgPartnerRepository {
    pub fn new(pool: PgPool, resilience: Arc<DbResilience>) -> Self {
        Self { pool, resilience }
    }

    async fn find_one(
        &self,
        op: &'static str,
        column: &'static str,
        bind: PartnerKey<'_>,
    ) -> RepoResult<Option<Partner>> {
        let pool = &self.pool;
        let sql = format!("SELECT {PARTNER_COLUMNS} FROM partners WHERE {column} = $1");
        let sql = sql.as_str();
        let row = self
            .resilience
            .run(op, || async move {
                let query = sqlx::query_as::<_, PartnerModel>(sql);
                let query = match bind {
                    PartnerKey::Id(id) => query.bind(id),
                    PartnerKey::Text(text) => query.bind(text),
                };
                query.fetch_optional(pool).await.map_err(map_db_error)
            })
            .await?;

        row.map(Partner::try_from).transpose()
    }
}

#[derive(Clone, Copy)]
enum PartnerKey<'a> {
    Id(i64),
    Text(&'a str),
}

#[async_trait]
impl PartnerRepository for PgPartnerRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Partner>> {
        self.find_one("partner.find_by_id", "id", PartnerKey::Id(id.into_inner()))
            .await
    }

    #[instrument(skip(self))]
    async fn find_by_user(&self, user_id: Snowflake) -> RepoResult<Option<Partner>> {
        self.find_one(
            "partner.find_by_user",
            "user_id",
            PartnerKey::Id(user_id.into_inner()),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn find_by_invite_code(&self, code: &str) -> RepoResult<Option<Partner>> {
        self.find_one(
            "partner.find_by_invite_code",
            "invite_code",
            PartnerKey::Text(code),
        )
        .await
    }

    #[instrument(skip(self, partner), fields(partner_id = %partner.id))]
    async fn create(&self, partner: &Partner) -> RepoResult<()> {
        self.resilience
            .guard("partner.create", async {
                sqlx::query(
                    r"
                    INSERT INTO partners (id, user_id, name, games, half_hourly_rate, status,
                                          customer_message, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                    ",
                )
                .bind(partner.id.into_inner())
                .bind(partner.user_id.into_inner())
                .bind(&partner.name)
                .bind(&partner.games)
                .bind(partner.half_hourly_rate)
                .bind(partner.status.as_str())
                .bind(&partner.customer_message)
                .bind(partner.created_at)
                .bind(partner.updated_at)
                .execute(&self.pool)
                .await
                .map_err(|e| map_unique_violation(e, || DomainError::PartnerProfileExists))?;
                Ok(())
            })
            .await
    }

    #[instrument(skip(self, partner), fields(partner_id = %partner.id))]
    async fn update_profile(&self, partner: &Partner) -> RepoResult<()> {
        let rows = self
            .resilience
            .guard("partner.update_profile", async {
                sqlx::query(
                    r"
                    UPDATE partners
                    SET name = $2, games = $3, half_hourly_rate = $4, customer_message = $5,
                        updated_at = NOW()
                    WHERE id = $1
                    ",
                )
                .bind(partner.id.into_inner())
                .bind(&partner.name)
                .bind(&partner.games)
                .bind(partner.half_hourly_rate)
                .bind(&partner.customer_message)
                .execute(&self.pool)
                .await
                .map(|r| r.rows_affected())
                .map_err(map_db_error)
            })
            .await?;

        if rows == 0 {
            return Err(DomainError::PartnerNotFound);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_availability(
        &self,
        id: Snowflake,
        available: bool,
        since: Option<DateTime<Utc>>,
    ) -> RepoResult<()> {
        let rows = self
            .resilience
            .guard("partner.set_availability", async {
                sqlx::query(
                    r"
                    UPDATE partners
                    SET is_available_now = $2, available_now_since = $3, updated_at = NOW()
                    WHERE id = $1
                    ",
                )
                .bind(id.into_inner())
                .bind(available)
                .bind(since)
                .execute(&self.pool)
                .await
                .map(|r| r.rows_affected())
                .map_err(map_db_error)
            })
            .await?;

        if rows == 0 {
            return Err(DomainError::PartnerNotFound);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_public(
        &self,
        query: &PartnerQuery,
        now: DateTime<Utc>,
    ) -> RepoResult<Vec<Partner>> {
        let pool = &self.pool;
        let sql = format!(
            r"
            SELECT {PARTNER_COLUMNS}
            FROM partners
            WHERE status = 'APPROVED'
              AND user_id IN (
                  SELECT id FROM users
                  WHERE deleted_at IS NULL
                    AND NOT (is_suspended
                             AND (suspension_ends_at IS NULL OR suspension_ends_at > $1))
              )
              AND ($2::TEXT IS NULL OR $2 = ANY(games))
              AND ($3::BOOLEAN IS NULL OR is_available_now = $3)
            ORDER BY is_available_now DESC, created_at DESC
            LIMIT $4 OFFSET $5
            "
        );
        let sql = sql.as_str();
        let game = query.game.as_deref();
        let rows = self
            .resilience
            .run("partner.list_public", || async move {
                sqlx::query_as::<_, PartnerModel>(sql)
                    .bind(now)
                    .bind(game)
                    .bind(query.available_now)
                    .bind(query.limit)
                    .bind(query.offset)
                    .fetch_all(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        map_all(rows)
    }

    #[instrument(skip(self))]
    async fn list(&self, query: &PartnerQuery) -> RepoResult<Vec<Partner>> {
        let pool = &self.pool;
        let sql = format!(
            r"
            SELECT {PARTNER_COLUMNS}
            FROM partners
            WHERE ($1::TEXT IS NULL OR status = $1)
              AND ($2::TEXT IS NULL OR $2 = ANY(games))
              AND ($3::BOOLEAN IS NULL OR is_available_now = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "
        );
        let sql = sql.as_str();
        let status = query.status.map(PartnerStatus::as_str);
        let game = query.game.as_deref();
        let rows = self
            .resilience
            .run("partner.list", || async move {
                sqlx::query_as::<_, PartnerModel>(sql)
                    .bind(status)
                    .bind(game)
                    .bind(query.available_now)
                    .bind(query.limit)
                    .bind(query.offset)
                    .fetch_all(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        map_all(rows)
    }

    #[instrument(skip(self))]
    async fn review(&self, id: Snowflake, status: PartnerStatus) -> RepoResult<Partner> {
        let model = self
            .resilience
            .guard("partner.review", async {
                let mut tx = self.pool.begin().await.map_err(map_db_error)?;

                let sql = format!(
                    r"
                    UPDATE partners SET status = $2, updated_at = NOW()
                    WHERE id = $1
                    RETURNING {PARTNER_COLUMNS}
                    "
                );
                let model = sqlx::query_as::<_, PartnerModel>(&sql)
                    .bind(id.into_inner())
                    .bind(status.as_str())
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(map_db_error)?
                    .ok_or(DomainError::PartnerNotFound)?;

                if status == PartnerStatus::Approved {
                    // Admins keep their role
                    sqlx::query(
                        r"
                        UPDATE users SET role = 'PARTNER', updated_at = NOW()
                        WHERE id = $1 AND role = 'CUSTOMER'
                        ",
                    )
                    .bind(model.user_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(map_db_error)?;
                }

                tx.commit().await.map_err(map_db_error)?;
                Ok(model)
            })
            .await?;

        Partner::try_from(model)
    }

    #[instrument(skip(self))]
    async fn close_lapsed_availability(&self, cutoff: DateTime<Utc>) -> RepoResult<Vec<Partner>> {
        let sql = format!(
            r"
            UPDATE partners
            SET is_available_now = FALSE, available_now_since = NULL, updated_at = NOW()
            WHERE is_available_now AND available_now_since < $1
            RETURNING {PARTNER_COLUMNS}
            "
        );
        let rows = self
            .resilience
            .guard("partner.close_lapsed_availability", async {
                sqlx::query_as::<_, PartnerModel>(&sql)
                    .bind(cutoff)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        map_all(rows)
    }

    #[instrument(skip(self))]
    async fn set_invite_code(&self, id: Snowflake, code: &str) -> RepoResult<()> {
        let rows = self
            .resilience
            .guard("partner.set_invite_code", async {
                sqlx::query(
                    "UPDATE partners SET invite_code = $2, updated_at = NOW() WHERE id = $1",
                )
                .bind(id.into_inner())
                .bind(code)
                .execute(&self.pool)
                .await
                .map(|r| r.rows_affected())
                .map_err(|e| map_unique_violation(e, || DomainError::ReferralCodeTaken))
            })
            .await?;

        if rows == 0 {
            return Err(DomainError::PartnerNotFound);
        }
        Ok(())
    }
}

//! PostgreSQL implementation of PromoCodeRepository

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use peiplay_core::entities::PromoCode;
use peiplay_core::error::DomainError;
use peiplay_core::traits::{PromoCodeRepository, RepoResult};
use peiplay_core::value_objects::Snowflake;

use crate::mappers::map_all;
use crate::models::PromoCodeModel;
use crate::resilience::DbResilience;

use super::error::{map_db_error, map_unique_violation};

const PROMO_COLUMNS: &str = r"
    id, code, discount_type, value, max_uses, used_count, valid_from, valid_until, is_active,
    partner_id, description, created_at, updated_at
";

#[derive(Clone)]
pub struct PgPromoCodeRepository {
    pool: PgPool,
    resilience: Arc<DbResilience>,
}

impl PgPromoCodeRepository {
    pub fn new(pool: PgPool, resilience: Arc<DbResilience>) -> Self {
        Self { pool, resilience }
    }
}

#[async_trait]
impl PromoCodeRepository for PgPromoCodeRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<PromoCode>> {
        let pool = &self.pool;
        let sql = format!("SELECT {PROMO_COLUMNS} FROM promo_codes WHERE id = $1");
        let sql = sql.as_str();
        let row = self
            .resilience
            .run("promo_code.find_by_id", || async move {
                sqlx::query_as::<_, PromoCodeModel>(sql)
                    .bind(id.into_inner())
                    .fetch_optional(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        row.map(PromoCode::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_code(&self, code: &str) -> RepoResult<Option<PromoCode>> {
        let pool = &self.pool;
        let sql = format!("SELECT {PROMO_COLUMNS} FROM promo_codes WHERE code = $1");
        let sql = sql.as_str();
        let row = self
            .resilience
            .run("promo_code.find_by_code", || async move {
                sqlx::query_as::<_, PromoCodeModel>(sql)
                    .bind(code)
                    .fetch_optional(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        row.map(PromoCode::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn list(&self, limit: i64, offset: i64) -> RepoResult<Vec<PromoCode>> {
        let pool = &self.pool;
        let sql = format!(
            "SELECT {PROMO_COLUMNS} FROM promo_codes ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        );
        let sql = sql.as_str();
        let rows = self
            .resilience
            .run("promo_code.list", || async move {
                sqlx::query_as::<_, PromoCodeModel>(sql)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        map_all(rows)
    }

    #[instrument(skip(self, promo), fields(code = %promo.code))]
    async fn create(&self, promo: &PromoCode) -> RepoResult<()> {
        self.resilience
            .guard("promo_code.create", async {
                sqlx::query(
                    r"
                    INSERT INTO promo_codes (id, code, discount_type, value, max_uses, used_count,
                                             valid_from, valid_until, is_active, partner_id,
                                             description, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                    ",
                )
                .bind(promo.id.into_inner())
                .bind(&promo.code)
                .bind(promo.discount_type.as_str())
                .bind(promo.value)
                .bind(promo.max_uses)
                .bind(promo.used_count)
                .bind(promo.valid_from)
                .bind(promo.valid_until)
                .bind(promo.is_active)
                .bind(promo.partner_id.map(Snowflake::into_inner))
                .bind(&promo.description)
                .bind(promo.created_at)
                .bind(promo.updated_at)
                .execute(&self.pool)
                .await
                .map_err(|e| map_unique_violation(e, || DomainError::PromoCodeExists))?;
                Ok(())
            })
            .await
    }

    #[instrument(skip(self, promo), fields(promo_id = %promo.id))]
    async fn update(&self, promo: &PromoCode) -> RepoResult<()> {
        let rows = self
            .resilience
            .guard("promo_code.update", async {
                sqlx::query(
                    r"
                    UPDATE promo_codes
                    SET code = $2, discount_type = $3, value = $4, max_uses = $5,
                        valid_from = $6, valid_until = $7, is_active = $8, partner_id = $9,
                        description = $10, updated_at = NOW()
                    WHERE id = $1
                    ",
                )
                .bind(promo.id.into_inner())
                .bind(&promo.code)
                .bind(promo.discount_type.as_str())
                .bind(promo.value)
                .bind(promo.max_uses)
                .bind(promo.valid_from)
                .bind(promo.valid_until)
                .bind(promo.is_active)
                .bind(promo.partner_id.map(Snowflake::into_inner))
                .bind(&promo.description)
                .execute(&self.pool)
                .await
                .map(|r| r.rows_affected())
                .map_err(|e| map_unique_violation(e, || DomainError::PromoCodeExists))
            })
            .await?;

        if rows == 0 {
            return Err(DomainError::PromoCodeNotFound(promo.id.to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Snowflake) -> RepoResult<()> {
        let rows = self
            .resilience
            .guard("promo_code.delete", async {
                sqlx::query("DELETE FROM promo_codes WHERE id = $1")
                    .bind(id.into_inner())
                    .execute(&self.pool)
                    .await
                    .map(|r| r.rows_affected())
                    .map_err(map_db_error)
            })
            .await?;

        if rows == 0 {
            return Err(DomainError::PromoCodeNotFound(id.to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_active(&self, id: Snowflake, active: bool) -> RepoResult<PromoCode> {
        let sql = format!(
            r"
            UPDATE promo_codes SET is_active = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {PROMO_COLUMNS}
            "
        );
        let row = self
            .resilience
            .guard("promo_code.set_active", async {
                sqlx::query_as::<_, PromoCodeModel>(&sql)
                    .bind(id.into_inner())
                    .bind(active)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?
            .ok_or_else(|| DomainError::PromoCodeNotFound(id.to_string()))?;

        PromoCode::try_from(row)
    }
}

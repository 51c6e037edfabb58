//! PostgreSQL implementation of FavoriteRepository

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use peiplay_core::entities::Partner;
use peiplay_core::traits::{FavoriteRepository, RepoResult};
use peiplay_core::value_objects::Snowflake;

use crate::mappers::map_all;
use crate::models::PartnerModel;
use crate::resilience::DbResilience;

use super::error::map_db_error;

#[derive(Clone)]
pub struct PgFavoriteRepository {
    pool: PgPool,
    resilience: Arc<DbResilience>,
}

impl PgFavoriteRepository {
    pub fn new(pool: PgPool, resilience: Arc<DbResilience>) -> Self {
        Self { pool, resilience }
    }
}

#[async_trait]
impl FavoriteRepository for PgFavoriteRepository {
    #[instrument(skip(self))]
    async fn list(&self, customer_id: Snowflake) -> RepoResult<Vec<Partner>> {
        let pool = &self.pool;
        let rows = self
            .resilience
            .run("favorite.list", || async move {
                sqlx::query_as::<_, PartnerModel>(
                    r"
                    SELECT p.*
                    FROM favorites f
                    JOIN partners p ON p.id = f.partner_id
                    WHERE f.customer_id = $1
                    ORDER BY f.created_at DESC
                    ",
                )
                .bind(customer_id.into_inner())
                .fetch_all(pool)
                .await
                .map_err(map_db_error)
            })
            .await?;

        map_all(rows)
    }

    #[instrument(skip(self))]
    async fn add(&self, customer_id: Snowflake, partner_id: Snowflake) -> RepoResult<()> {
        self.resilience
            .guard("favorite.add", async {
                sqlx::query(
                    r"
                    INSERT INTO favorites (customer_id, partner_id)
                    VALUES ($1, $2)
                    ON CONFLICT DO NOTHING
                    ",
                )
                .bind(customer_id.into_inner())
                .bind(partner_id.into_inner())
                .execute(&self.pool)
                .await
                .map_err(map_db_error)?;
                Ok(())
            })
            .await
    }

    #[instrument(skip(self))]
    async fn remove(&self, customer_id: Snowflake, partner_id: Snowflake) -> RepoResult<()> {
        self.resilience
            .guard("favorite.remove", async {
                sqlx::query("DELETE FROM favorites WHERE customer_id = $1 AND partner_id = $2")
                    .bind(customer_id.into_inner())
                    .bind(partner_id.into_inner())
                    .execute(&self.pool)
                    .await
                    .map_err(map_db_error)?;
                Ok(())
            })
            .await
    }
}

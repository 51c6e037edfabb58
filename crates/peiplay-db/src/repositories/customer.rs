//! PostgreSQL implementation of CustomerRepository

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use peiplay_core::entities::Customer;
use peiplay_core::traits::{CustomerRepository, RepoResult};
use peiplay_core::value_objects::Snowflake;

use crate::models::CustomerModel;
use crate::resilience::DbResilience;

use super::error::map_db_error;

#[derive(Clone)]
pub struct PgCustomerRepository {
    pool: PgPool,
    resilience: Arc<DbResilience>,
}

impl PgCustomerRepository {
    pub fn new(pool: PgPool, resilience: Arc<DbResilience>) -> Self {
        Self { pool, resilience }
    }
}

#[async_trait]
impl CustomerRepository for PgCustomerRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Customer>> {
        let pool = &self.pool;
        let row = self
            .resilience
            .run("customer.find_by_id", || async move {
                sqlx::query_as::<_, CustomerModel>(
                    "SELECT id, user_id, created_at FROM customers WHERE id = $1",
                )
                .bind(id.into_inner())
                .fetch_optional(pool)
                .await
                .map_err(map_db_error)
            })
            .await?;

        Ok(row.map(Customer::from))
    }

    #[instrument(skip(self))]
    async fn find_by_user(&self, user_id: Snowflake) -> RepoResult<Option<Customer>> {
        let pool = &self.pool;
        let row = self
            .resilience
            .run("customer.find_by_user", || async move {
                sqlx::query_as::<_, CustomerModel>(
                    "SELECT id, user_id, created_at FROM customers WHERE user_id = $1",
                )
                .bind(user_id.into_inner())
                .fetch_optional(pool)
                .await
                .map_err(map_db_error)
            })
            .await?;

        Ok(row.map(Customer::from))
    }
}

//! PostgreSQL implementation of UserRepository

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use peiplay_core::entities::{Customer, User};
use peiplay_core::error::DomainError;
use peiplay_core::traits::{RepoResult, UserQuery, UserRepository};
use peiplay_core::value_objects::Snowflake;

use crate::mappers::map_all;
use crate::models::UserModel;
use crate::resilience::DbResilience;

use super::error::{map_db_error, map_unique_violation};

const USER_COLUMNS: &str = r"
    id, email, name, role, email_verified, is_suspended, suspension_reason,
    suspension_ends_at, created_at, updated_at
";

/// Filters shared by `list` and `count`; `$1` role, `$2` search term
const USER_FILTER: &str = r"
    WHERE deleted_at IS NULL
      AND ($1::TEXT IS NULL OR role = $1)
      AND ($2::TEXT IS NULL OR name ILIKE '%' || $2 || '%' OR email ILIKE '%' || $2 || '%')
";

/// PostgreSQL implementation of UserRepository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
    resilience: Arc<DbResilience>,
}

impl PgUserRepository {
    pub fn new(pool: PgPool, resilience: Arc<DbResilience>) -> Self {
        Self { pool, resilience }
    }
}

fn ensure_updated(id: Snowflake, rows: u64) -> RepoResult<()> {
    if rows == 0 {
        return Err(DomainError::UserNotFound(id));
    }
    Ok(())
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<User>> {
        let pool = &self.pool;
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL");
        let sql = sql.as_str();
        let row = self
            .resilience
            .run("user.find_by_id", || async move {
                sqlx::query_as::<_, UserModel>(sql)
                    .bind(id.into_inner())
                    .fetch_optional(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        row.map(User::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let pool = &self.pool;
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1) AND deleted_at IS NULL"
        );
        let sql = sql.as_str();
        let row = self
            .resilience
            .run("user.find_by_email", || async move {
                sqlx::query_as::<_, UserModel>(sql)
                    .bind(email)
                    .fetch_optional(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        row.map(User::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn email_exists(&self, email: &str) -> RepoResult<bool> {
        let pool = &self.pool;
        self.resilience
            .run("user.email_exists", || async move {
                sqlx::query_scalar::<_, bool>(
                    r"
                    SELECT EXISTS(
                        SELECT 1 FROM users WHERE lower(email) = lower($1) AND deleted_at IS NULL
                    )
                    ",
                )
                .bind(email)
                .fetch_one(pool)
                .await
                .map_err(map_db_error)
            })
            .await
    }

    #[instrument(skip(self, password_hash), fields(user_id = %user.id))]
    async fn create_with_customer(
        &self,
        user: &User,
        customer: &Customer,
        password_hash: &str,
    ) -> RepoResult<()> {
        self.resilience
            .guard("user.create_with_customer", async {
                let mut tx = self.pool.begin().await.map_err(map_db_error)?;

                sqlx::query(
                    r"
                    INSERT INTO users (id, email, name, password_hash, role, email_verified,
                                       is_suspended, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7, $8)
                    ",
                )
                .bind(user.id.into_inner())
                .bind(&user.email)
                .bind(&user.name)
                .bind(password_hash)
                .bind(user.role.as_str())
                .bind(user.email_verified)
                .bind(user.created_at)
                .bind(user.updated_at)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_unique_violation(e, || DomainError::EmailAlreadyExists))?;

                sqlx::query("INSERT INTO customers (id, user_id, created_at) VALUES ($1, $2, $3)")
                    .bind(customer.id.into_inner())
                    .bind(customer.user_id.into_inner())
                    .bind(customer.created_at)
                    .execute(&mut *tx)
                    .await
                    .map_err(map_db_error)?;

                tx.commit().await.map_err(map_db_error)
            })
            .await
    }

    #[instrument(skip(self))]
    async fn get_password_hash(&self, id: Snowflake) -> RepoResult<Option<String>> {
        let pool = &self.pool;
        self.resilience
            .run("user.get_password_hash", || async move {
                sqlx::query_scalar::<_, String>(
                    "SELECT password_hash FROM users WHERE id = $1 AND deleted_at IS NULL",
                )
                .bind(id.into_inner())
                .fetch_optional(pool)
                .await
                .map_err(map_db_error)
            })
            .await
    }

    #[instrument(skip(self, password_hash))]
    async fn update_password(&self, id: Snowflake, password_hash: &str) -> RepoResult<()> {
        let rows = self
            .resilience
            .guard("user.update_password", async {
                sqlx::query(
                    r"
                    UPDATE users SET password_hash = $2, updated_at = NOW()
                    WHERE id = $1 AND deleted_at IS NULL
                    ",
                )
                .bind(id.into_inner())
                .bind(password_hash)
                .execute(&self.pool)
                .await
                .map(|r| r.rows_affected())
                .map_err(map_db_error)
            })
            .await?;

        ensure_updated(id, rows)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn update_suspension(&self, user: &User) -> RepoResult<()> {
        let rows = self
            .resilience
            .guard("user.update_suspension", async {
                sqlx::query(
                    r"
                    UPDATE users
                    SET is_suspended = $2, suspension_reason = $3, suspension_ends_at = $4,
                        updated_at = $5
                    WHERE id = $1 AND deleted_at IS NULL
                    ",
                )
                .bind(user.id.into_inner())
                .bind(user.is_suspended)
                .bind(&user.suspension_reason)
                .bind(user.suspension_ends_at)
                .bind(user.updated_at)
                .execute(&self.pool)
                .await
                .map(|r| r.rows_affected())
                .map_err(map_db_error)
            })
            .await?;

        ensure_updated(user.id, rows)
    }

    #[instrument(skip(self))]
    async fn set_email_verified(&self, id: Snowflake, verified: bool) -> RepoResult<()> {
        let rows = self
            .resilience
            .guard("user.set_email_verified", async {
                sqlx::query(
                    r"
                    UPDATE users SET email_verified = $2, updated_at = NOW()
                    WHERE id = $1 AND deleted_at IS NULL
                    ",
                )
                .bind(id.into_inner())
                .bind(verified)
                .execute(&self.pool)
                .await
                .map(|r| r.rows_affected())
                .map_err(map_db_error)
            })
            .await?;

        ensure_updated(id, rows)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Snowflake) -> RepoResult<()> {
        let rows = self
            .resilience
            .guard("user.delete", async {
                sqlx::query(
                    r"
                    UPDATE users SET deleted_at = NOW(), updated_at = NOW()
                    WHERE id = $1 AND deleted_at IS NULL
                    ",
                )
                .bind(id.into_inner())
                .execute(&self.pool)
                .await
                .map(|r| r.rows_affected())
                .map_err(map_db_error)
            })
            .await?;

        ensure_updated(id, rows)
    }

    #[instrument(skip(self))]
    async fn list(&self, query: &UserQuery) -> RepoResult<Vec<User>> {
        let pool = &self.pool;
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users {USER_FILTER} ORDER BY created_at DESC LIMIT $3 OFFSET $4"
        );
        let sql = sql.as_str();
        let role = query.role.map(|r| r.as_str());
        let search = query.search.as_deref();
        let rows = self
            .resilience
            .run("user.list", || async move {
                sqlx::query_as::<_, UserModel>(sql)
                    .bind(role)
                    .bind(search)
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
    async fn count(&self, query: &UserQuery) -> RepoResult<i64> {
        let pool = &self.pool;
        let sql = format!("SELECT COUNT(*) FROM users {USER_FILTER}");
        let sql = sql.as_str();
        let role = query.role.map(|r| r.as_str());
        let search = query.search.as_deref();
        self.resilience
            .run("user.count", || async move {
                sqlx::query_scalar::<_, i64>(sql)
                    .bind(role)
                    .bind(search)
                    .fetch_one(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await
    }

    #[instrument(skip(self))]
    async fn find_admin_ids(&self) -> RepoResult<Vec<Snowflake>> {
        let pool = &self.pool;
        let ids = self
            .resilience
            .run("user.find_admin_ids", || async move {
                sqlx::query_scalar::<_, i64>(
                    "SELECT id FROM users WHERE role = 'ADMIN' AND deleted_at IS NULL",
                )
                .fetch_all(pool)
                .await
                .map_err(map_db_error)
            })
            .await?;

        Ok(ids.into_iter().map(Snowflake::new).collect())
    }
}

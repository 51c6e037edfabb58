//! PostgreSQL implementation of NotificationRepository

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use peiplay_core::entities::Notification;
use peiplay_core::traits::{NotificationRepository, RepoResult};
use peiplay_core::value_objects::Snowflake;

use crate::mappers::map_all;
use crate::models::NotificationModel;
use crate::resilience::DbResilience;

use super::error::map_db_error;

#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
    resilience: Arc<DbResilience>,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool, resilience: Arc<DbResilience>) -> Self {
        Self { pool, resilience }
    }

    async fn count_where(
        &self,
        op: &'static str,
        unread_only: bool,
        user_id: Snowflake,
    ) -> RepoResult<i64> {
        let pool = &self.pool;
        self.resilience
            .run(op, || async move {
                sqlx::query_scalar::<_, i64>(
                    r"
                    SELECT COUNT(*) FROM notifications
                    WHERE user_id = $1 AND NOT is_deleted AND (NOT $2 OR NOT is_read)
                    ",
                )
                .bind(user_id.into_inner())
                .bind(unread_only)
                .fetch_one(pool)
                .await
                .map_err(map_db_error)
            })
            .await
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    #[instrument(skip(self, notification), fields(user_id = %notification.user_id, kind = notification.notification_type.as_str()))]
    async fn create(&self, notification: &Notification) -> RepoResult<()> {
        self.resilience
            .guard("notification.create", async {
                sqlx::query(
                    r"
                    INSERT INTO notifications (id, user_id, notification_type, title, content, data,
                                               is_read, is_deleted, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                    ",
                )
                .bind(notification.id.into_inner())
                .bind(notification.user_id.into_inner())
                .bind(notification.notification_type.as_str())
                .bind(&notification.title)
                .bind(&notification.content)
                .bind(&notification.data)
                .bind(notification.is_read)
                .bind(notification.is_deleted)
                .bind(notification.created_at)
                .execute(&self.pool)
                .await
                .map_err(map_db_error)?;
                Ok(())
            })
            .await
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        user_id: Snowflake,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<Notification>> {
        let pool = &self.pool;
        let rows = self
            .resilience
            .run("notification.list", || async move {
                sqlx::query_as::<_, NotificationModel>(
                    r"
                    SELECT id, user_id, notification_type, title, content, data, is_read,
                           is_deleted, created_at
                    FROM notifications
                    WHERE user_id = $1 AND NOT is_deleted
                    ORDER BY created_at DESC, id DESC
                    LIMIT $2 OFFSET $3
                    ",
                )
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
    async fn count(&self, user_id: Snowflake) -> RepoResult<i64> {
        self.count_where("notification.count", false, user_id).await
    }

    #[instrument(skip(self))]
    async fn unread_count(&self, user_id: Snowflake) -> RepoResult<i64> {
        self.count_where("notification.unread_count", true, user_id)
            .await
    }

    #[instrument(skip(self))]
    async fn mark_all_read(&self, user_id: Snowflake) -> RepoResult<u64> {
        self.resilience
            .guard("notification.mark_all_read", async {
                sqlx::query(
                    r"
                    UPDATE notifications SET is_read = TRUE
                    WHERE user_id = $1 AND NOT is_read AND NOT is_deleted
                    ",
                )
                .bind(user_id.into_inner())
                .execute(&self.pool)
                .await
                .map(|r| r.rows_affected())
                .map_err(map_db_error)
            })
            .await
    }

    #[instrument(skip(self))]
    async fn mark_read(&self, id: Snowflake, user_id: Snowflake) -> RepoResult<bool> {
        let rows = self
            .resilience
            .guard("notification.mark_read", async {
                sqlx::query(
                    r"
                    UPDATE notifications SET is_read = TRUE
                    WHERE id = $1 AND user_id = $2 AND NOT is_deleted
                    ",
                )
                .bind(id.into_inner())
                .bind(user_id.into_inner())
                .execute(&self.pool)
                .await
                .map(|r| r.rows_affected())
                .map_err(map_db_error)
            })
            .await?;

        Ok(rows > 0)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Snowflake, user_id: Snowflake) -> RepoResult<bool> {
        let rows = self
            .resilience
            .guard("notification.delete", async {
                sqlx::query(
                    r"
                    UPDATE notifications SET is_deleted = TRUE
                    WHERE id = $1 AND user_id = $2 AND NOT is_deleted
                    ",
                )
                .bind(id.into_inner())
                .bind(user_id.into_inner())
                .execute(&self.pool)
                .await
                .map(|r| r.rows_affected())
                .map_err(map_db_error)
            })
            .await?;

        Ok(rows > 0)
    }
}

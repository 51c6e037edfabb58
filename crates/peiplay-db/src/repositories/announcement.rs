//! PostgreSQL implementation of AnnouncementRepository

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use peiplay_core::entities::Announcement;
use peiplay_core::error::DomainError;
use peiplay_core::traits::{AnnouncementRepository, RepoResult};
use peiplay_core::value_objects::Snowflake;

use crate::models::AnnouncementModel;
use crate::resilience::DbResilience;

use super::error::map_db_error;

const ANNOUNCEMENT_COLUMNS: &str =
    "id, title, content, is_active, expires_at, created_by, created_at, updated_at";

#[derive(Clone)]
pub struct PgAnnouncementRepository {
    pool: PgPool,
    resilience: Arc<DbResilience>,
}

impl PgAnnouncementRepository {
    pub fn new(pool: PgPool, resilience: Arc<DbResilience>) -> Self {
        Self { pool, resilience }
    }
}

#[async_trait]
impl AnnouncementRepository for PgAnnouncementRepository {
    #[instrument(skip(self))]
    async fn list_active(&self, now: DateTime<Utc>) -> RepoResult<Vec<Announcement>> {
        let pool = &self.pool;
        let sql = format!(
            r"
            SELECT {ANNOUNCEMENT_COLUMNS}
            FROM announcements
            WHERE is_active AND (expires_at IS NULL OR expires_at > $1)
            ORDER BY created_at DESC
            "
        );
        let sql = sql.as_str();
        let rows = self
            .resilience
            .run("announcement.list_active", || async move {
                sqlx::query_as::<_, AnnouncementModel>(sql)
                    .bind(now)
                    .fetch_all(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        Ok(rows.into_iter().map(Announcement::from).collect())
    }

    #[instrument(skip(self))]
    async fn list_all(&self, limit: i64, offset: i64) -> RepoResult<Vec<Announcement>> {
        let pool = &self.pool;
        let sql = format!(
            r"
            SELECT {ANNOUNCEMENT_COLUMNS}
            FROM announcements
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "
        );
        let sql = sql.as_str();
        let rows = self
            .resilience
            .run("announcement.list_all", || async move {
                sqlx::query_as::<_, AnnouncementModel>(sql)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        Ok(rows.into_iter().map(Announcement::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Announcement>> {
        let pool = &self.pool;
        let sql = format!("SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements WHERE id = $1");
        let sql = sql.as_str();
        let row = self
            .resilience
            .run("announcement.find_by_id", || async move {
                sqlx::query_as::<_, AnnouncementModel>(sql)
                    .bind(id.into_inner())
                    .fetch_optional(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        Ok(row.map(Announcement::from))
    }

    #[instrument(skip(self, announcement), fields(announcement_id = %announcement.id))]
    async fn create(&self, announcement: &Announcement) -> RepoResult<()> {
        self.resilience
            .guard("announcement.create", async {
                sqlx::query(
                    r"
                    INSERT INTO announcements (id, title, content, is_active, expires_at,
                                               created_by, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    ",
                )
                .bind(announcement.id.into_inner())
                .bind(&announcement.title)
                .bind(&announcement.content)
                .bind(announcement.is_active)
                .bind(announcement.expires_at)
                .bind(announcement.created_by.into_inner())
                .bind(announcement.created_at)
                .bind(announcement.updated_at)
                .execute(&self.pool)
                .await
                .map_err(map_db_error)?;
                Ok(())
            })
            .await
    }

    #[instrument(skip(self, announcement), fields(announcement_id = %announcement.id))]
    async fn update(&self, announcement: &Announcement) -> RepoResult<()> {
        let rows = self
            .resilience
            .guard("announcement.update", async {
                sqlx::query(
                    r"
                    UPDATE announcements
                    SET title = $2, content = $3, is_active = $4, expires_at = $5, updated_at = $6
                    WHERE id = $1
                    ",
                )
                .bind(announcement.id.into_inner())
                .bind(&announcement.title)
                .bind(&announcement.content)
                .bind(announcement.is_active)
                .bind(announcement.expires_at)
                .bind(announcement.updated_at)
                .execute(&self.pool)
                .await
                .map(|r| r.rows_affected())
                .map_err(map_db_error)
            })
            .await?;

        if rows == 0 {
            return Err(DomainError::AnnouncementNotFound(announcement.id));
        }
        Ok(())
    }
}

//! PostgreSQL implementation of ReviewRepository

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use peiplay_core::entities::{RatingSummary, Review};
use peiplay_core::error::DomainError;
use peiplay_core::traits::{RepoResult, ReviewRepository};
use peiplay_core::value_objects::Snowflake;

use crate::models::{RatingSummaryModel, ReviewModel};
use crate::resilience::DbResilience;

use super::error::{map_db_error, map_unique_violation};

const REVIEW_COLUMNS: &str =
    "id, booking_id, reviewer_id, reviewee_id, rating, comment, is_approved, created_at";

#[derive(Clone)]
pub struct PgReviewRepository {
    pool: PgPool,
    resilience: Arc<DbResilience>,
}

impl PgReviewRepository {
    pub fn new(pool: PgPool, resilience: Arc<DbResilience>) -> Self {
        Self { pool, resilience }
    }
}

#[async_trait]
impl ReviewRepository for PgReviewRepository {
    #[instrument(skip(self, review), fields(booking_id = %review.booking_id, reviewer_id = %review.reviewer_id))]
    async fn create(&self, review: &Review) -> RepoResult<()> {
        self.resilience
            .guard("review.create", async {
                sqlx::query(
                    r"
                    INSERT INTO reviews (id, booking_id, reviewer_id, reviewee_id, rating, comment,
                                         is_approved, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    ",
                )
                .bind(review.id.into_inner())
                .bind(review.booking_id.into_inner())
                .bind(review.reviewer_id.into_inner())
                .bind(review.reviewee_id.into_inner())
                .bind(review.rating)
                .bind(&review.comment)
                .bind(review.is_approved)
                .bind(review.created_at)
                .execute(&self.pool)
                .await
                .map_err(|e| map_unique_violation(e, || DomainError::AlreadyReviewed))?;
                Ok(())
            })
            .await
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Review>> {
        let pool = &self.pool;
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1");
        let sql = sql.as_str();
        let row = self
            .resilience
            .run("review.find_by_id", || async move {
                sqlx::query_as::<_, ReviewModel>(sql)
                    .bind(id.into_inner())
                    .fetch_optional(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        Ok(row.map(Review::from))
    }

    #[instrument(skip(self))]
    async fn exists(&self, booking_id: Snowflake, reviewer_id: Snowflake) -> RepoResult<bool> {
        let pool = &self.pool;
        self.resilience
            .run("review.exists", || async move {
                sqlx::query_scalar::<_, bool>(
                    r"
                    SELECT EXISTS(
                        SELECT 1 FROM reviews WHERE booking_id = $1 AND reviewer_id = $2
                    )
                    ",
                )
                .bind(booking_id.into_inner())
                .bind(reviewer_id.into_inner())
                .fetch_one(pool)
                .await
                .map_err(map_db_error)
            })
            .await
    }

    #[instrument(skip(self))]
    async fn list_by_reviewee(
        &self,
        reviewee_id: Snowflake,
        include_unapproved: bool,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<Review>> {
        let pool = &self.pool;
        let sql = format!(
            r"
            SELECT {REVIEW_COLUMNS}
            FROM reviews
            WHERE reviewee_id = $1 AND ($2 OR is_approved)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "
        );
        let sql = sql.as_str();
        let rows = self
            .resilience
            .run("review.list_by_reviewee", || async move {
                sqlx::query_as::<_, ReviewModel>(sql)
                    .bind(reviewee_id.into_inner())
                    .bind(include_unapproved)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        Ok(rows.into_iter().map(Review::from).collect())
    }

    #[instrument(skip(self))]
    async fn list_by_booking(
        &self,
        booking_id: Snowflake,
        include_unapproved: bool,
    ) -> RepoResult<Vec<Review>> {
        let pool = &self.pool;
        let sql = format!(
            r"
            SELECT {REVIEW_COLUMNS}
            FROM reviews
            WHERE booking_id = $1 AND ($2 OR is_approved)
            ORDER BY created_at DESC
            "
        );
        let sql = sql.as_str();
        let rows = self
            .resilience
            .run("review.list_by_booking", || async move {
                sqlx::query_as::<_, ReviewModel>(sql)
                    .bind(booking_id.into_inner())
                    .bind(include_unapproved)
                    .fetch_all(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        Ok(rows.into_iter().map(Review::from).collect())
    }

    #[instrument(skip(self))]
    async fn list_pending(&self, limit: i64, offset: i64) -> RepoResult<Vec<Review>> {
        let pool = &self.pool;
        let sql = format!(
            r"
            SELECT {REVIEW_COLUMNS}
            FROM reviews
            WHERE NOT is_approved
            ORDER BY created_at
            LIMIT $1 OFFSET $2
            "
        );
        let sql = sql.as_str();
        let rows = self
            .resilience
            .run("review.list_pending", || async move {
                sqlx::query_as::<_, ReviewModel>(sql)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        Ok(rows.into_iter().map(Review::from).collect())
    }

    #[instrument(skip(self))]
    async fn approve(&self, id: Snowflake) -> RepoResult<()> {
        let rows = self
            .resilience
            .guard("review.approve", async {
                sqlx::query("UPDATE reviews SET is_approved = TRUE WHERE id = $1")
                    .bind(id.into_inner())
                    .execute(&self.pool)
                    .await
                    .map(|r| r.rows_affected())
                    .map_err(map_db_error)
            })
            .await?;

        if rows == 0 {
            return Err(DomainError::ReviewNotFound(id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Snowflake) -> RepoResult<()> {
        let rows = self
            .resilience
            .guard("review.delete", async {
                sqlx::query("DELETE FROM reviews WHERE id = $1")
                    .bind(id.into_inner())
                    .execute(&self.pool)
                    .await
                    .map(|r| r.rows_affected())
                    .map_err(map_db_error)
            })
            .await?;

        if rows == 0 {
            return Err(DomainError::ReviewNotFound(id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn rating_summary(&self, reviewee_id: Snowflake) -> RepoResult<RatingSummary> {
        let pool = &self.pool;
        let row = self
            .resilience
            .run("review.rating_summary", || async move {
                sqlx::query_as::<_, RatingSummaryModel>(
                    r"
                    SELECT AVG(rating)::NUMERIC AS average, COUNT(*) AS count
                    FROM reviews
                    WHERE reviewee_id = $1 AND is_approved
                    ",
                )
                .bind(reviewee_id.into_inner())
                .fetch_one(pool)
                .await
                .map_err(map_db_error)
            })
            .await?;

        Ok(RatingSummary::from(row))
    }
}

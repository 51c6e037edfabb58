//! PostgreSQL implementation of ScheduleRepository

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use tracing::instrument;

use peiplay_core::entities::Schedule;
use peiplay_core::error::DomainError;
use peiplay_core::traits::{RepoResult, ScheduleRepository};
use peiplay_core::value_objects::Snowflake;

use crate::models::ScheduleModel;
use crate::resilience::DbResilience;

use super::error::{is_overlap_violation, map_db_error};
use super::terminal_statuses;

const SCHEDULE_COLUMNS: &str = "id, partner_id, date, start_time, end_time, is_available, created_at";

/// Column arrays for an `UNNEST` bulk insert
struct ScheduleColumns {
    ids: Vec<i64>,
    partner_ids: Vec<i64>,
    dates: Vec<NaiveDate>,
    starts: Vec<DateTime<Utc>>,
    ends: Vec<DateTime<Utc>>,
    available: Vec<bool>,
    created: Vec<DateTime<Utc>>,
}

impl From<&[Schedule]> for ScheduleColumns {
    fn from(schedules: &[Schedule]) -> Self {
        Self {
            ids: schedules.iter().map(|s| s.id.into_inner()).collect(),
            partner_ids: schedules.iter().map(|s| s.partner_id.into_inner()).collect(),
            dates: schedules.iter().map(|s| s.date).collect(),
            starts: schedules.iter().map(|s| s.start_time).collect(),
            ends: schedules.iter().map(|s| s.end_time).collect(),
            available: schedules.iter().map(|s| s.is_available).collect(),
            created: schedules.iter().map(|s| s.created_at).collect(),
        }
    }
}

const UNNEST_INSERT: &str = r"
    INSERT INTO schedules (id, partner_id, date, start_time, end_time, is_available, created_at)
    SELECT * FROM UNNEST($1::BIGINT[], $2::BIGINT[], $3::DATE[], $4::TIMESTAMPTZ[],
                         $5::TIMESTAMPTZ[], $6::BOOLEAN[], $7::TIMESTAMPTZ[])
";

#[derive(Clone)]
pub struct PgScheduleRepository {
    pool: PgPool,
    resilience: Arc<DbResilience>,
}

impl PgScheduleRepository {
    pub fn new(pool: PgPool, resilience: Arc<DbResilience>) -> Self {
        Self { pool, resilience }
    }

    /// Open schedules that collide with any of the candidate rows
    async fn open_overlaps(&self, columns: &ScheduleColumns) -> RepoResult<Vec<Snowflake>> {
        let ids = sqlx::query_scalar::<_, i64>(
            r"
            SELECT DISTINCT e.id
            FROM schedules e
            JOIN UNNEST($1::BIGINT[], $2::TIMESTAMPTZ[], $3::TIMESTAMPTZ[])
                 AS n(partner_id, start_time, end_time)
              ON e.partner_id = n.partner_id
             AND e.start_time < n.end_time
             AND n.start_time < e.end_time
            WHERE e.is_available
            ORDER BY e.id
            ",
        )
        .bind(&columns.partner_ids)
        .bind(&columns.starts)
        .bind(&columns.ends)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(ids.into_iter().map(Snowflake::new).collect())
    }
}

#[async_trait]
impl ScheduleRepository for PgScheduleRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Schedule>> {
        let pool = &self.pool;
        let sql = format!("SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE id = $1");
        let sql = sql.as_str();
        let row = self
            .resilience
            .run("schedule.find_by_id", || async move {
                sqlx::query_as::<_, ScheduleModel>(sql)
                    .bind(id.into_inner())
                    .fetch_optional(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        Ok(row.map(Schedule::from))
    }

    #[instrument(skip(self))]
    async fn find_by_partner(
        &self,
        partner_id: Snowflake,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> RepoResult<Vec<Schedule>> {
        let pool = &self.pool;
        let sql = format!(
            r"
            SELECT {SCHEDULE_COLUMNS}
            FROM schedules
            WHERE partner_id = $1
              AND ($2::TIMESTAMPTZ IS NULL OR start_time >= $2)
              AND ($3::TIMESTAMPTZ IS NULL OR start_time <= $3)
            ORDER BY start_time
            "
        );
        let sql = sql.as_str();
        let rows = self
            .resilience
            .run("schedule.find_by_partner", || async move {
                sqlx::query_as::<_, ScheduleModel>(sql)
                    .bind(partner_id.into_inner())
                    .bind(from)
                    .bind(to)
                    .fetch_all(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        Ok(rows.into_iter().map(Schedule::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_bookable(
        &self,
        partner_id: Snowflake,
        from: DateTime<Utc>,
        to: Option<DateTime<Utc>>,
    ) -> RepoResult<Vec<Schedule>> {
        let pool = &self.pool;
        let sql = format!(
            r"
            SELECT {SCHEDULE_COLUMNS}
            FROM schedules s
            WHERE s.partner_id = $1
              AND s.is_available
              AND s.start_time > $2
              AND ($3::TIMESTAMPTZ IS NULL OR s.start_time <= $3)
              AND NOT EXISTS (
                  SELECT 1 FROM bookings b
                  WHERE b.schedule_id = s.id AND b.status <> ALL($4)
              )
            ORDER BY s.start_time
            "
        );
        let sql = sql.as_str();
        let terminal = terminal_statuses();
        let terminal = terminal.as_slice();
        let rows = self
            .resilience
            .run("schedule.find_bookable", || async move {
                sqlx::query_as::<_, ScheduleModel>(sql)
                    .bind(partner_id.into_inner())
                    .bind(from)
                    .bind(to)
                    .bind(terminal)
                    .fetch_all(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        Ok(rows.into_iter().map(Schedule::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_on_dates(
        &self,
        partner_id: Snowflake,
        dates: &[NaiveDate],
    ) -> RepoResult<Vec<Schedule>> {
        if dates.is_empty() {
            return Ok(Vec::new());
        }
        let pool = &self.pool;
        let sql = format!(
            r"
            SELECT {SCHEDULE_COLUMNS}
            FROM schedules
            WHERE partner_id = $1 AND date = ANY($2)
            ORDER BY start_time
            "
        );
        let sql = sql.as_str();
        let rows = self
            .resilience
            .run("schedule.find_on_dates", || async move {
                sqlx::query_as::<_, ScheduleModel>(sql)
                    .bind(partner_id.into_inner())
                    .bind(dates)
                    .fetch_all(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        Ok(rows.into_iter().map(Schedule::from).collect())
    }

    #[instrument(skip(self, schedules), fields(count = schedules.len()))]
    async fn insert_all(&self, schedules: &[Schedule]) -> RepoResult<()> {
        if schedules.is_empty() {
            return Ok(());
        }
        let columns = ScheduleColumns::from(schedules);
        self.resilience
            .guard("schedule.insert_all", async {
                let inserted = sqlx::query(UNNEST_INSERT)
                    .bind(&columns.ids)
                    .bind(&columns.partner_ids)
                    .bind(&columns.dates)
                    .bind(&columns.starts)
                    .bind(&columns.ends)
                    .bind(&columns.available)
                    .bind(&columns.created)
                    .execute(&self.pool)
                    .await;

                match inserted {
                    Ok(_) => Ok(()),
                    Err(e) if is_overlap_violation(&e) => {
                        let schedule_ids = self.open_overlaps(&columns).await?;
                        Err(DomainError::ScheduleConflict { schedule_ids })
                    }
                    Err(e) => Err(map_db_error(e)),
                }
            })
            .await
    }

    #[instrument(skip(self, schedules), fields(count = schedules.len()))]
    async fn insert_skipping_conflicts(
        &self,
        schedules: &[Schedule],
    ) -> RepoResult<Vec<Snowflake>> {
        if schedules.is_empty() {
            return Ok(Vec::new());
        }
        let columns = ScheduleColumns::from(schedules);
        // Without a conflict target this covers the partial slot key and the exclusion constraint
        let sql = format!("{UNNEST_INSERT} ON CONFLICT DO NOTHING RETURNING id");
        let ids = self
            .resilience
            .guard("schedule.insert_skipping_conflicts", async {
                sqlx::query_scalar::<_, i64>(&sql)
                    .bind(&columns.ids)
                    .bind(&columns.partner_ids)
                    .bind(&columns.dates)
                    .bind(&columns.starts)
                    .bind(&columns.ends)
                    .bind(&columns.available)
                    .bind(&columns.created)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        if ids.len() < schedules.len() {
            tracing::debug!(
                requested = schedules.len(),
                inserted = ids.len(),
                "Skipped conflicting schedules"
            );
        }
        Ok(ids.into_iter().map(Snowflake::new).collect())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Snowflake) -> RepoResult<()> {
        let terminal = terminal_statuses();
        self.resilience
            .guard("schedule.delete", async {
                let mut tx = self.pool.begin().await.map_err(map_db_error)?;

                let exists = sqlx::query_scalar::<_, i64>(
                    "SELECT id FROM schedules WHERE id = $1 FOR UPDATE",
                )
                .bind(id.into_inner())
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_db_error)?;
                if exists.is_none() {
                    return Err(DomainError::ScheduleNotFound(id));
                }

                let (active, history) = sqlx::query_as::<_, (bool, bool)>(
                    r"
                    SELECT
                        EXISTS(SELECT 1 FROM bookings WHERE schedule_id = $1 AND status <> ALL($2)),
                        EXISTS(SELECT 1 FROM bookings WHERE schedule_id = $1)
                    ",
                )
                .bind(id.into_inner())
                .bind(&terminal)
                .fetch_one(&mut *tx)
                .await
                .map_err(map_db_error)?;

                if active {
                    return Err(DomainError::ScheduleHasActiveBooking);
                }

                if history {
                    // Past bookings still reference the row; close it instead
                    sqlx::query("UPDATE schedules SET is_available = FALSE WHERE id = $1")
                        .bind(id.into_inner())
                        .execute(&mut *tx)
                        .await
                        .map_err(map_db_error)?;
                } else {
                    sqlx::query("DELETE FROM schedules WHERE id = $1")
                        .bind(id.into_inner())
                        .execute(&mut *tx)
                        .await
                        .map_err(map_db_error)?;
                }

                tx.commit().await.map_err(map_db_error)
            })
            .await
    }
}

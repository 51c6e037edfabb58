//! PostgreSQL implementation of BookingRepository
//!
//! `create` and `cancel` run as single transactions holding row locks on the
//! schedules or booking they touch. The partial unique index
//! `bookings_active_schedule_key` backs the one-active-booking-per-schedule
//! rule when two transactions race past the explicit checks.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

use peiplay_core::entities::{Booking, BookingStatus, CancelOutcome, Partner, PromoCode, Schedule};
use peiplay_core::error::DomainError;
use peiplay_core::traits::{BookingQuery, BookingRepository, NewBookings, RepoResult};
use peiplay_core::value_objects::Snowflake;

use crate::mappers::map_all;
use crate::models::{BookingModel, PartnerModel, PromoCodeModel, ScheduleModel};
use crate::resilience::DbResilience;

use super::error::{map_db_error, map_overlap_violation, map_unique_violation};
use super::{terminal_statuses, PARTNER_COLUMNS, SELECT_BOOKING};

/// `$1` customer, `$2` partner, `$3` status
const BOOKING_FILTER: &str = r"
    WHERE ($1::BIGINT IS NULL OR b.customer_id = $1)
      AND ($2::BIGINT IS NULL OR s.partner_id = $2)
      AND ($3::TEXT IS NULL OR b.status = $3)
";

fn due_statuses() -> Vec<&'static str> {
    BookingStatus::ALL
        .into_iter()
        .filter(|s| s.is_due_for_completion())
        .map(BookingStatus::as_str)
        .collect()
}

/// A locked schedule with its priced booking
struct PlannedBooking {
    id: Snowflake,
    schedule: Schedule,
    order_number: String,
    original_amount: rust_decimal::Decimal,
    final_amount: rust_decimal::Decimal,
}

#[derive(Clone)]
pub struct PgBookingRepository {
    pool: PgPool,
    resilience: Arc<DbResilience>,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool, resilience: Arc<DbResilience>) -> Self {
        Self { pool, resilience }
    }

    async fn fetch_by_ids(
        tx: &mut Transaction<'_, Postgres>,
        ids: &[i64],
    ) -> RepoResult<Vec<Booking>> {
        let sql = format!("{SELECT_BOOKING} WHERE b.id = ANY($1) ORDER BY s.start_time");
        let rows = sqlx::query_as::<_, BookingModel>(&sql)
            .bind(ids)
            .fetch_all(&mut **tx)
            .await
            .map_err(map_db_error)?;
        map_all(rows)
    }

    async fn lock_by_id(
        tx: &mut Transaction<'_, Postgres>,
        id: Snowflake,
    ) -> RepoResult<Booking> {
        let sql = format!("{SELECT_BOOKING} WHERE b.id = $1 FOR UPDATE OF b");
        let row = sqlx::query_as::<_, BookingModel>(&sql)
            .bind(id.into_inner())
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_db_error)?
            .ok_or(DomainError::BookingNotFound(id))?;
        Booking::try_from(row)
    }

    async fn create_in_tx(&self, request: &NewBookings) -> RepoResult<Vec<Booking>> {
        let terminal = terminal_statuses();
        let schedule_ids: Vec<i64> = request
            .schedule_ids
            .iter()
            .map(|id| id.into_inner())
            .collect();

        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        // Partners before schedules on every booking path, so lock order never inverts
        let partner_ids: Vec<i64> = match &request.instant_schedule {
            Some(slot) => vec![slot.partner_id.into_inner()],
            None => sqlx::query_scalar::<_, i64>(
                "SELECT DISTINCT partner_id FROM schedules WHERE id = ANY($1)",
            )
            .bind(&schedule_ids)
            .fetch_all(&mut *tx)
            .await
            .map_err(map_db_error)?,
        };
        let sql = format!(
            "SELECT {PARTNER_COLUMNS} FROM partners WHERE id = ANY($1) ORDER BY id FOR UPDATE"
        );
        let partners: HashMap<Snowflake, Partner> = sqlx::query_as::<_, PartnerModel>(&sql)
            .bind(&partner_ids)
            .fetch_all(&mut *tx)
            .await
            .map_err(map_db_error)?
            .into_iter()
            .map(|m| Partner::try_from(m).map(|p| (p.id, p)))
            .collect::<RepoResult<_>>()?;

        if let Some(slot) = &request.instant_schedule {
            Self::prepare_instant_slot(&mut tx, slot, &terminal).await?;
        }

        // Lock in id order so concurrent requests cannot deadlock
        let locked = sqlx::query_as::<_, ScheduleModel>(
            r"
            SELECT id, partner_id, date, start_time, end_time, is_available, created_at
            FROM schedules
            WHERE id = ANY($1)
            ORDER BY id
            FOR UPDATE
            ",
        )
        .bind(&schedule_ids)
        .fetch_all(&mut *tx)
        .await
        .map_err(map_db_error)?;

        let mut schedules: HashMap<Snowflake, Schedule> = locked
            .into_iter()
            .map(|m| {
                let s = Schedule::from(m);
                (s.id, s)
            })
            .collect();

        let mut ordered = Vec::with_capacity(request.schedule_ids.len());
        for id in &request.schedule_ids {
            let schedule = schedules
                .remove(id)
                .ok_or(DomainError::ScheduleNotFound(*id))?;
            if !schedule.is_available {
                return Err(DomainError::BookingConflict { schedule_id: *id });
            }
            ordered.push(schedule);
        }

        let taken = sqlx::query_scalar::<_, i64>(
            r"
            SELECT schedule_id FROM bookings
            WHERE schedule_id = ANY($1) AND status <> ALL($2)
            LIMIT 1
            ",
        )
        .bind(&schedule_ids)
        .bind(&terminal)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_error)?;
        if let Some(schedule_id) = taken {
            return Err(DomainError::BookingConflict {
                schedule_id: Snowflake::new(schedule_id),
            });
        }

        for (i, a) in ordered.iter().enumerate() {
            if ordered[i + 1..]
                .iter()
                .any(|b| a.window().overlaps(&b.window()))
            {
                return Err(DomainError::TimeConflict { schedule_id: a.id });
            }
        }

        for schedule in &ordered {
            if let Some(clash) = Self::booked_overlap(&mut tx, schedule, &terminal).await? {
                return Err(DomainError::TimeConflict { schedule_id: clash });
            }
        }

        let mut promo = match request.promo_code.as_deref() {
            Some(code) => Some(Self::lock_promo(&mut tx, code).await?),
            None => None,
        };

        let mut planned = Vec::with_capacity(ordered.len());
        for (i, schedule) in ordered.into_iter().enumerate() {
            let partner = partners
                .get(&schedule.partner_id)
                .ok_or(DomainError::PartnerNotFound)?;
            if !partner.is_approved() {
                return Err(DomainError::PartnerNotApproved);
            }
            let original = partner.price_for(&schedule.window());
            let final_amount = match promo.as_mut() {
                Some(code) => {
                    let discount = code.apply(original, Some(partner.id), request.now)?;
                    code.used_count += 1;
                    discount.final_amount
                }
                None => original,
            };
            let (Some(id), Some(order_number)) =
                (request.booking_ids.get(i), request.order_numbers.get(i))
            else {
                return Err(DomainError::InternalError(
                    "booking ids and order numbers must match the schedules".to_string(),
                ));
            };
            planned.push(PlannedBooking {
                id: *id,
                schedule,
                order_number: order_number.clone(),
                original_amount: original,
                final_amount,
            });
        }

        for booking in &planned {
            sqlx::query(
                r"
                INSERT INTO bookings (id, customer_id, schedule_id, status, original_amount,
                                      final_amount, promo_code_id, order_number, is_instant,
                                      created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
                ",
            )
            .bind(booking.id.into_inner())
            .bind(request.customer_id.into_inner())
            .bind(booking.schedule.id.into_inner())
            .bind(BookingStatus::PendingPayment.as_str())
            .bind(booking.original_amount)
            .bind(booking.final_amount)
            .bind(promo.as_ref().map(|p| p.id.into_inner()))
            .bind(&booking.order_number)
            .bind(request.instant_schedule.is_some())
            .bind(request.now)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                map_unique_violation(e, || DomainError::BookingConflict {
                    schedule_id: booking.schedule.id,
                })
            })?;
        }

        if let Some(code) = &promo {
            sqlx::query(
                r"
                UPDATE promo_codes SET used_count = used_count + $2, updated_at = NOW()
                WHERE id = $1
                ",
            )
            .bind(code.id.into_inner())
            .bind(i32::try_from(planned.len()).unwrap_or(i32::MAX))
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        let ids: Vec<i64> = planned.iter().map(|b| b.id.into_inner()).collect();
        let bookings = Self::fetch_by_ids(&mut tx, &ids).await?;

        tx.commit().await.map_err(map_db_error)?;
        Ok(bookings)
    }

    /// Schedule of an active booking of the same partner overlapping `schedule`
    async fn booked_overlap(
        tx: &mut Transaction<'_, Postgres>,
        schedule: &Schedule,
        terminal: &[&str],
    ) -> RepoResult<Option<Snowflake>> {
        let clash = sqlx::query_scalar::<_, i64>(
            r"
            SELECT b.schedule_id
            FROM bookings b
            JOIN schedules s ON s.id = b.schedule_id
            WHERE s.partner_id = $1
              AND b.status <> ALL($2)
              AND s.start_time < $4
              AND $3 < s.end_time
              AND b.schedule_id <> $5
            LIMIT 1
            ",
        )
        .bind(schedule.partner_id.into_inner())
        .bind(terminal)
        .bind(schedule.start_time)
        .bind(schedule.end_time)
        .bind(schedule.id.into_inner())
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_db_error)?;
        Ok(clash.map(Snowflake::new))
    }

    /// Store the slot of an instant booking
    ///
    /// An overlapping active booking is a `TimeConflict`. Open slots without
    /// an active booking are closed so the instant slot can take their time.
    async fn prepare_instant_slot(
        tx: &mut Transaction<'_, Postgres>,
        slot: &Schedule,
        terminal: &[&str],
    ) -> RepoResult<()> {
        if let Some(clash) = Self::booked_overlap(tx, slot, terminal).await? {
            return Err(DomainError::TimeConflict { schedule_id: clash });
        }

        let closed = sqlx::query_scalar::<_, i64>(
            r"
            UPDATE schedules s
            SET is_available = FALSE
            WHERE s.partner_id = $1
              AND s.is_available
              AND s.start_time < $3
              AND $2 < s.end_time
              AND NOT EXISTS (
                  SELECT 1 FROM bookings b
                  WHERE b.schedule_id = s.id AND b.status <> ALL($4)
              )
            RETURNING s.id
            ",
        )
        .bind(slot.partner_id.into_inner())
        .bind(slot.start_time)
        .bind(slot.end_time)
        .bind(terminal)
        .fetch_all(&mut **tx)
        .await
        .map_err(map_db_error)?;
        if !closed.is_empty() {
            debug!(closed = ?closed, "Open schedules closed for instant booking");
        }

        sqlx::query(
            r"
            INSERT INTO schedules (id, partner_id, date, start_time, end_time, is_available,
                                   created_at)
            VALUES ($1, $2, $3, $4, $5, TRUE, $6)
            ",
        )
        .bind(slot.id.into_inner())
        .bind(slot.partner_id.into_inner())
        .bind(slot.date)
        .bind(slot.start_time)
        .bind(slot.end_time)
        .bind(slot.created_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            map_overlap_violation(e, || DomainError::TimeConflict {
                schedule_id: slot.id,
            })
        })?;
        Ok(())
    }

    async fn lock_promo(tx: &mut Transaction<'_, Postgres>, code: &str) -> RepoResult<PromoCode> {
        let normalized = PromoCode::normalize(code);
        let row = sqlx::query_as::<_, PromoCodeModel>(
            r"
            SELECT id, code, discount_type, value, max_uses, used_count, valid_from, valid_until,
                   is_active, partner_id, description, created_at, updated_at
            FROM promo_codes
            WHERE code = $1
            FOR UPDATE
            ",
        )
        .bind(&normalized)
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_db_error)?
        .ok_or(DomainError::PromoCodeNotFound(normalized))?;
        PromoCode::try_from(row)
    }

    async fn cancel_in_tx(
        &self,
        id: Snowflake,
        cancellation_id: Snowflake,
        reason: Option<&str>,
    ) -> RepoResult<(Booking, CancelOutcome)> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let mut booking = Self::lock_by_id(&mut tx, id).await?;
        let outcome = booking.cancel()?;

        if outcome == CancelOutcome::Cancelled {
            sqlx::query("UPDATE bookings SET status = $2, updated_at = $3 WHERE id = $1")
                .bind(id.into_inner())
                .bind(booking.status.as_str())
                .bind(booking.updated_at)
                .execute(&mut *tx)
                .await
                .map_err(map_db_error)?;

            sqlx::query(
                r"
                INSERT INTO booking_cancellations (id, booking_id, customer_id, reason)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (booking_id) DO NOTHING
                ",
            )
            .bind(cancellation_id.into_inner())
            .bind(id.into_inner())
            .bind(booking.customer_id.into_inner())
            .bind(reason)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)?;
        Ok((booking, outcome))
    }

    async fn complete_due_in_tx(&self, now: DateTime<Utc>) -> RepoResult<Vec<Booking>> {
        let due = due_statuses();
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let ids = sqlx::query_scalar::<_, i64>(
            r"
            UPDATE bookings b
            SET status = 'COMPLETED', updated_at = NOW()
            FROM schedules s
            WHERE s.id = b.schedule_id
              AND b.status = ANY($1)
              AND s.end_time <= $2
            RETURNING b.id
            ",
        )
        .bind(&due)
        .bind(now)
        .fetch_all(&mut *tx)
        .await
        .map_err(map_db_error)?;

        let bookings = if ids.is_empty() {
            Vec::new()
        } else {
            Self::fetch_by_ids(&mut tx, &ids).await?
        };

        tx.commit().await.map_err(map_db_error)?;
        Ok(bookings)
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Booking>> {
        let pool = &self.pool;
        let sql = format!("{SELECT_BOOKING} WHERE b.id = $1");
        let sql = sql.as_str();
        let row = self
            .resilience
            .run("booking.find_by_id", || async move {
                sqlx::query_as::<_, BookingModel>(sql)
                    .bind(id.into_inner())
                    .fetch_optional(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        row.map(Booking::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_order_number(&self, order_number: &str) -> RepoResult<Option<Booking>> {
        let pool = &self.pool;
        let sql = format!("{SELECT_BOOKING} WHERE b.order_number = $1");
        let sql = sql.as_str();
        let row = self
            .resilience
            .run("booking.find_by_order_number", || async move {
                sqlx::query_as::<_, BookingModel>(sql)
                    .bind(order_number)
                    .fetch_optional(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        row.map(Booking::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn list(&self, query: &BookingQuery) -> RepoResult<Vec<Booking>> {
        let pool = &self.pool;
        let sql = format!(
            "{SELECT_BOOKING} {BOOKING_FILTER} ORDER BY s.start_time DESC LIMIT $4 OFFSET $5"
        );
        let sql = sql.as_str();
        let customer = query.customer_id.map(Snowflake::into_inner);
        let partner = query.partner_id.map(Snowflake::into_inner);
        let status = query.status.map(BookingStatus::as_str);
        let rows = self
            .resilience
            .run("booking.list", || async move {
                sqlx::query_as::<_, BookingModel>(sql)
                    .bind(customer)
                    .bind(partner)
                    .bind(status)
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
    async fn count(&self, query: &BookingQuery) -> RepoResult<i64> {
        let pool = &self.pool;
        let sql = format!(
            r"
            SELECT COUNT(*)
            FROM bookings b
            JOIN schedules s ON s.id = b.schedule_id
            {BOOKING_FILTER}
            "
        );
        let sql = sql.as_str();
        let customer = query.customer_id.map(Snowflake::into_inner);
        let partner = query.partner_id.map(Snowflake::into_inner);
        let status = query.status.map(BookingStatus::as_str);
        self.resilience
            .run("booking.count", || async move {
                sqlx::query_scalar::<_, i64>(sql)
                    .bind(customer)
                    .bind(partner)
                    .bind(status)
                    .fetch_one(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await
    }

    #[instrument(skip(self, request), fields(customer_id = %request.customer_id, schedules = request.schedule_ids.len()))]
    async fn create(&self, request: &NewBookings) -> RepoResult<Vec<Booking>> {
        self.resilience
            .guard("booking.create", self.create_in_tx(request))
            .await
    }

    #[instrument(skip(self))]
    async fn cancel(
        &self,
        id: Snowflake,
        cancellation_id: Snowflake,
        reason: Option<&str>,
    ) -> RepoResult<(Booking, CancelOutcome)> {
        self.resilience
            .guard("booking.cancel", self.cancel_in_tx(id, cancellation_id, reason))
            .await
    }

    #[instrument(skip(self, booking), fields(booking_id = %booking.id, status = %booking.status))]
    async fn save_status(&self, booking: &Booking, expected: BookingStatus) -> RepoResult<()> {
        let rows = self
            .resilience
            .guard("booking.save_status", async {
                sqlx::query(
                    r"
                    UPDATE bookings SET status = $2, reject_reason = $3, updated_at = $4
                    WHERE id = $1 AND status = $5
                    ",
                )
                .bind(booking.id.into_inner())
                .bind(booking.status.as_str())
                .bind(&booking.reject_reason)
                .bind(booking.updated_at)
                .bind(expected.as_str())
                .execute(&self.pool)
                .await
                .map(|r| r.rows_affected())
                .map_err(map_db_error)
            })
            .await?;

        if rows == 0 {
            // Someone else moved the booking since it was read
            return Err(DomainError::InvalidStatusTransition {
                from: expected.to_string(),
                to: booking.status.to_string(),
            });
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_order_number(&self, id: Snowflake, order_number: &str) -> RepoResult<()> {
        let rows = self
            .resilience
            .guard("booking.set_order_number", async {
                sqlx::query(
                    "UPDATE bookings SET order_number = $2, updated_at = NOW() WHERE id = $1",
                )
                .bind(id.into_inner())
                .bind(order_number)
                .execute(&self.pool)
                .await
                .map(|r| r.rows_affected())
                .map_err(map_db_error)
            })
            .await?;

        if rows == 0 {
            return Err(DomainError::BookingNotFound(id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_current_for_partner(
        &self,
        partner_id: Snowflake,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<Booking>> {
        let pool = &self.pool;
        let sql = format!(
            r"
            {SELECT_BOOKING}
            WHERE s.partner_id = $1
              AND b.status = ANY($2)
              AND s.start_time <= $3
              AND s.end_time > $3
            ORDER BY s.start_time
            LIMIT 1
            "
        );
        let sql = sql.as_str();
        let due = due_statuses();
        let due = due.as_slice();
        let row = self
            .resilience
            .run("booking.find_current_for_partner", || async move {
                sqlx::query_as::<_, BookingModel>(sql)
                    .bind(partner_id.into_inner())
                    .bind(due)
                    .bind(now)
                    .fetch_optional(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        row.map(Booking::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn complete_due(&self, now: DateTime<Utc>) -> RepoResult<Vec<Booking>> {
        self.resilience
            .guard("booking.complete_due", self.complete_due_in_tx(now))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_due_statuses() {
        let due = due_statuses();
        assert_eq!(due, vec!["PARTNER_ACCEPTED", "CONFIRMED"]);
    }
}

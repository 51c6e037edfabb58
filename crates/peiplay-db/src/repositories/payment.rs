//! PostgreSQL implementation of PaymentRepository

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use peiplay_core::entities::{Booking, BookingStatus, Payment, PaymentCallback, PaymentStatus};
use peiplay_core::error::DomainError;
use peiplay_core::traits::{CallbackOutcome, PaymentRepository, RepoResult};
use peiplay_core::value_objects::Snowflake;

use crate::mappers::map_all;
use crate::models::{BookingModel, PaymentModel};
use crate::resilience::DbResilience;

use super::error::map_db_error;
use super::SELECT_BOOKING;

const PAYMENT_COLUMNS: &str = r"
    id, booking_id, provider, idempotency_key, amount_cents, currency, status, raw,
    created_at, updated_at
";

#[derive(Clone)]
pub struct PgPaymentRepository {
    pool: PgPool,
    resilience: Arc<DbResilience>,
}

impl PgPaymentRepository {
    pub fn new(pool: PgPool, resilience: Arc<DbResilience>) -> Self {
        Self { pool, resilience }
    }

    async fn record_in_tx(&self, callback: &PaymentCallback) -> RepoResult<CallbackOutcome> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let sql = format!("{SELECT_BOOKING} WHERE b.order_number = $1 FOR UPDATE OF b");
        let model = sqlx::query_as::<_, BookingModel>(&sql)
            .bind(&callback.order_number)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_db_error)?
            .ok_or_else(|| DomainError::OrderNotFound(callback.order_number.clone()))?;
        let mut booking = Booking::try_from(model)?;

        let sql = format!(
            r"
            INSERT INTO payments (id, booking_id, provider, idempotency_key, amount_cents,
                                  currency, status, raw)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (idempotency_key) DO UPDATE
            SET status = EXCLUDED.status,
                amount_cents = EXCLUDED.amount_cents,
                raw = EXCLUDED.raw,
                updated_at = NOW()
            RETURNING {PAYMENT_COLUMNS}
            "
        );
        let payment = sqlx::query_as::<_, PaymentModel>(&sql)
            .bind(callback.payment_id.into_inner())
            .bind(booking.id.into_inner())
            .bind(Payment::PROVIDER_ECPAY)
            .bind(&callback.trade_no)
            .bind(Payment::cents_from_amount(callback.amount))
            .bind(Payment::CURRENCY_TWD)
            .bind(callback.status.as_str())
            .bind(&callback.raw_payload)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_error)?;

        let transitioned =
            callback.status == PaymentStatus::Succeeded && booking.awaiting_payment();
        if transitioned {
            if booking.status == BookingStatus::Pending {
                booking.transition(BookingStatus::PendingPayment)?;
            }
            booking.transition(BookingStatus::PaidWaitingPartnerConfirmation)?;
            sqlx::query("UPDATE bookings SET status = $2, updated_at = $3 WHERE id = $1")
                .bind(booking.id.into_inner())
                .bind(booking.status.as_str())
                .bind(booking.updated_at)
                .execute(&mut *tx)
                .await
                .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)?;

        Ok(CallbackOutcome {
            booking,
            payment: Payment::try_from(payment)?,
            transitioned,
        })
    }
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    #[instrument(skip(self, callback), fields(order_number = %callback.order_number, trade_no = %callback.trade_no))]
    async fn record_callback(&self, callback: &PaymentCallback) -> RepoResult<CallbackOutcome> {
        self.resilience
            .guard("payment.record_callback", self.record_in_tx(callback))
            .await
    }

    #[instrument(skip(self))]
    async fn find_by_booking(&self, booking_id: Snowflake) -> RepoResult<Vec<Payment>> {
        let pool = &self.pool;
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE booking_id = $1 ORDER BY created_at DESC"
        );
        let sql = sql.as_str();
        let rows = self
            .resilience
            .run("payment.find_by_booking", || async move {
                sqlx::query_as::<_, PaymentModel>(sql)
                    .bind(booking_id.into_inner())
                    .fetch_all(pool)
                    .await
                    .map_err(map_db_error)
            })
            .await?;

        map_all(rows)
    }
}

//! Schedule, booking, and payment mappers

use peiplay_core::{Booking, BookingStatus, DomainError, Payment, PaymentStatus, Schedule, Snowflake};

use super::parse_column;
use crate::models::{BookingModel, PaymentModel, ScheduleModel};

impl From<ScheduleModel> for Schedule {
    fn from(model: ScheduleModel) -> Self {
        Schedule {
            id: Snowflake::new(model.id),
            partner_id: Snowflake::new(model.partner_id),
            date: model.date,
            start_time: model.start_time,
            end_time: model.end_time,
            is_available: model.is_available,
            created_at: model.created_at,
        }
    }
}

impl TryFrom<BookingModel> for Booking {
    type Error = DomainError;

    fn try_from(model: BookingModel) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: Snowflake::new(model.id),
            customer_id: Snowflake::new(model.customer_id),
            customer_user_id: Snowflake::new(model.customer_user_id),
            schedule_id: Snowflake::new(model.schedule_id),
            partner_id: Snowflake::new(model.partner_id),
            partner_user_id: Snowflake::new(model.partner_user_id),
            start_time: model.start_time,
            end_time: model.end_time,
            status: parse_column(&model.status, "bookings.status", BookingStatus::parse)?,
            original_amount: model.original_amount,
            final_amount: model.final_amount,
            promo_code_id: model.promo_code_id.map(Snowflake::new),
            order_number: model.order_number,
            is_instant: model.is_instant,
            reject_reason: model.reject_reason,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl TryFrom<PaymentModel> for Payment {
    type Error = DomainError;

    fn try_from(model: PaymentModel) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: Snowflake::new(model.id),
            booking_id: Snowflake::new(model.booking_id),
            provider: model.provider,
            idempotency_key: model.idempotency_key,
            amount_cents: model.amount_cents,
            currency: model.currency,
            status: parse_column(&model.status, "payments.status", PaymentStatus::parse)?,
            raw_payload: model.raw,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

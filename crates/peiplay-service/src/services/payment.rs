//! Payment service
//!
//! Issues merchant order numbers and records gateway callbacks. Callbacks for
//! coin recharges share the endpoint and are routed by order number prefix.

use chrono::Utc;
use peiplay_cache::PubSubChannel;
use peiplay_core::entities::{
    generate_order_number, BookingStatus, NotificationType, PaymentCallback, PaymentStatus,
};
use peiplay_core::events::{BookingStatusChangedEvent, DomainEvent};
use peiplay_core::{DomainError, Snowflake};
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use crate::dto::{CreateOrderRequest, OrderResponse, PaymentCallbackRequest};

use super::coin::CoinService;
use super::context::ServiceContext;
use super::error::ServiceResult;
use super::notification::NotificationService;

/// Acknowledgement body the gateway expects
pub const CALLBACK_ACK: &str = "1|OK";

/// Prefix that marks a coin recharge order
const RECHARGE_ORDER_PREFIX: &str = "RECHARGE-";

fn is_recharge_order(order_number: &str) -> bool {
    order_number.starts_with(RECHARGE_ORDER_PREFIX)
}

pub struct PaymentService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> PaymentService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Assign a fresh order number to an unpaid booking
    #[instrument(skip(self, request), fields(booking_id = %request.booking_id))]
    pub async fn create_order(
        &self,
        user_id: Snowflake,
        request: CreateOrderRequest,
    ) -> ServiceResult<OrderResponse> {
        let repo = self.ctx.booking_repo();
        let mut booking = repo
            .find_by_id(request.booking_id)
            .await?
            .ok_or(DomainError::BookingNotFound(request.booking_id))?;

        if !booking.is_customer(user_id) {
            return Err(DomainError::Forbidden("not your booking".to_string()).into());
        }
        if !booking.awaiting_payment() {
            return Err(DomainError::InvalidStatusTransition {
                from: booking.status.to_string(),
                to: BookingStatus::PendingPayment.to_string(),
            }
            .into());
        }

        if booking.status == BookingStatus::Pending {
            booking.transition(BookingStatus::PendingPayment)?;
            repo.save_status(&booking, BookingStatus::Pending).await?;
        }

        let order_number = generate_order_number(Utc::now());
        repo.set_order_number(booking.id, &order_number).await?;

        info!(booking_id = %booking.id, order_number = %order_number, "Payment order created");

        Ok(OrderResponse {
            order_number,
            amount: booking.final_amount,
            booking_id: booking.id,
        })
    }

    /// Record a gateway callback and acknowledge it
    #[instrument(skip(self, request, raw_payload), fields(order_number = %request.merchant_trade_no, rtn_code = %request.rtn_code))]
    pub async fn callback(
        &self,
        request: PaymentCallbackRequest,
        raw_payload: serde_json::Value,
    ) -> ServiceResult<&'static str> {
        let status = PaymentStatus::from_return_code(&request.rtn_code);

        if is_recharge_order(&request.merchant_trade_no) {
            if status == PaymentStatus::Succeeded {
                CoinService::new(self.ctx)
                    .confirm_recharge(&request.merchant_trade_no)
                    .await?;
            } else {
                warn!(order_number = %request.merchant_trade_no, "Recharge payment failed");
            }
            return Ok(CALLBACK_ACK);
        }

        let callback = PaymentCallback {
            payment_id: self.ctx.generate_id(),
            order_number: request.merchant_trade_no,
            trade_no: request.trade_no,
            status,
            amount: request.trade_amt,
            raw_payload,
        };
        let outcome = self.ctx.payment_repo().record_callback(&callback).await?;
        let booking = &outcome.booking;

        if Decimal::from(callback.amount) != booking.final_amount {
            warn!(
                booking_id = %booking.id,
                paid = callback.amount,
                expected = %booking.final_amount,
                "Payment amount does not match booking"
            );
        }

        let notifications = NotificationService::new(self.ctx);
        match status {
            PaymentStatus::Succeeded if outcome.transitioned => {
                info!(booking_id = %booking.id, "Booking paid");
                notifications
                    .notify(
                        booking.partner_user_id,
                        NotificationType::PaymentSuccess,
                        "Booking paid",
                        "A customer paid for a booking. Please confirm it.",
                        Some(serde_json::json!({
                            "booking_id": booking.id,
                            "order_number": callback.order_number,
                        })),
                    )
                    .await;

                let event = DomainEvent::BookingStatusChanged(BookingStatusChangedEvent {
                    booking_id: booking.id,
                    status: booking.status,
                    timestamp: booking.updated_at,
                });
                let channels = [
                    PubSubChannel::user(booking.customer_user_id),
                    PubSubChannel::user(booking.partner_user_id),
                ];
                if let Err(e) = self.ctx.publisher().publish_domain_event(&channels, &event).await {
                    warn!(booking_id = %booking.id, error = %e, "Failed to publish status change");
                }
            }
            PaymentStatus::Succeeded => {
                info!(booking_id = %booking.id, status = %booking.status, "Repeated payment callback");
            }
            PaymentStatus::Failed | PaymentStatus::Pending => {
                warn!(booking_id = %booking.id, "Payment failed");
                notifications
                    .notify(
                        booking.customer_user_id,
                        NotificationType::PaymentFailed,
                        "Payment failed",
                        "Your payment did not go through. Please try again.",
                        Some(serde_json::json!({
                            "booking_id": booking.id,
                            "order_number": callback.order_number,
                        })),
                    )
                    .await;
            }
        }

        Ok(CALLBACK_ACK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recharge_orders_are_routed() {
        assert!(is_recharge_order("RECHARGE-1700000000000-ABC123XYZ"));
        assert!(!is_recharge_order("PEI202501011200001234"));
    }
}

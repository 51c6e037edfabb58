//! Booking entity and its status state machine

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::{Snowflake, TimeRange};

/// Maximum number of schedules a single booking request may cover
pub const MAX_SCHEDULES_PER_REQUEST: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    PendingPayment,
    PaidWaitingPartnerConfirmation,
    PartnerAccepted,
    PartnerRejected,
    Confirmed,
    Completed,
    CompletedWithAmountMismatch,
    Cancelled,
    Rejected,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 10] = [
        Self::Pending,
        Self::PendingPayment,
        Self::PaidWaitingPartnerConfirmation,
        Self::PartnerAccepted,
        Self::PartnerRejected,
        Self::Confirmed,
        Self::Completed,
        Self::CompletedWithAmountMismatch,
        Self::Cancelled,
        Self::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::PendingPayment => "PENDING_PAYMENT",
            Self::PaidWaitingPartnerConfirmation => "PAID_WAITING_PARTNER_CONFIRMATION",
            Self::PartnerAccepted => "PARTNER_ACCEPTED",
            Self::PartnerRejected => "PARTNER_REJECTED",
            Self::Confirmed => "CONFIRMED",
            Self::Completed => "COMPLETED",
            Self::CompletedWithAmountMismatch => "COMPLETED_WITH_AMOUNT_MISMATCH",
            Self::Cancelled => "CANCELLED",
            Self::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// No further transitions are possible from a terminal status
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Cancelled
                | Self::Completed
                | Self::Rejected
                | Self::PartnerRejected
                | Self::CompletedWithAmountMismatch
        )
    }

    /// Active bookings hold their schedule and the partner's time
    #[inline]
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    /// Statuses the completion sweep moves to `Completed` once the slot ends
    pub fn is_due_for_completion(self) -> bool {
        matches!(self, Self::Confirmed | Self::PartnerAccepted)
    }

    pub fn can_transition_to(self, to: BookingStatus) -> bool {
        use BookingStatus::{
            Cancelled, Completed, CompletedWithAmountMismatch, Confirmed,
            PaidWaitingPartnerConfirmation, PartnerAccepted, PartnerRejected, Pending,
            PendingPayment, Rejected,
        };
        match self {
            Pending => matches!(
                to,
                PendingPayment | Confirmed | PartnerAccepted | PartnerRejected | Rejected | Cancelled
            ),
            PendingPayment => matches!(
                to,
                PaidWaitingPartnerConfirmation | PartnerAccepted | PartnerRejected | Cancelled
            ),
            PaidWaitingPartnerConfirmation => {
                matches!(to, PartnerAccepted | PartnerRejected | Confirmed | Cancelled)
            }
            PartnerAccepted => matches!(
                to,
                Confirmed | Completed | CompletedWithAmountMismatch | Cancelled
            ),
            Confirmed => matches!(to, Completed | CompletedWithAmountMismatch | Cancelled),
            Completed | CompletedWithAmountMismatch | Cancelled | Rejected | PartnerRejected => {
                false
            }
        }
    }

    /// Statuses this one may move to, in declaration order
    pub fn successors(self) -> Vec<BookingStatus> {
        Self::ALL
            .into_iter()
            .filter(|to| self.can_transition_to(*to))
            .collect()
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partner's answer to a booking request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingResponse {
    Accept,
    Reject,
}

/// Result of a cancellation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    AlreadyCancelled,
}

/// Booking with its schedule window and both parties resolved
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub id: Snowflake,
    pub customer_id: Snowflake,
    pub customer_user_id: Snowflake,
    pub schedule_id: Snowflake,
    pub partner_id: Snowflake,
    pub partner_user_id: Snowflake,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BookingStatus,
    pub original_amount: Decimal,
    pub final_amount: Decimal,
    pub promo_code_id: Option<Snowflake>,
    pub order_number: Option<String>,
    pub is_instant: bool,
    pub reject_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn window(&self) -> TimeRange {
        TimeRange {
            start: self.start_time,
            end: self.end_time,
        }
    }

    pub fn discount_amount(&self) -> Decimal {
        self.original_amount - self.final_amount
    }

    #[inline]
    pub fn is_customer(&self, user_id: Snowflake) -> bool {
        self.customer_user_id == user_id
    }

    #[inline]
    pub fn is_partner(&self, user_id: Snowflake) -> bool {
        self.partner_user_id == user_id
    }

    pub fn is_participant(&self, user_id: Snowflake) -> bool {
        self.is_customer(user_id) || self.is_partner(user_id)
    }

    /// Move to `to`, enforcing the state machine
    pub fn transition(&mut self, to: BookingStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(to) {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Cancel; repeating the call on a cancelled booking is a no-op
    pub fn cancel(&mut self) -> Result<CancelOutcome, DomainError> {
        if self.status == BookingStatus::Cancelled {
            return Ok(CancelOutcome::AlreadyCancelled);
        }
        self.transition(BookingStatus::Cancelled)?;
        Ok(CancelOutcome::Cancelled)
    }

    /// Partner accept/reject; rejecting requires a non-blank reason
    pub fn respond(
        &mut self,
        response: BookingResponse,
        reason: Option<&str>,
    ) -> Result<(), DomainError> {
        if !matches!(
            self.status,
            BookingStatus::Pending
                | BookingStatus::PendingPayment
                | BookingStatus::PaidWaitingPartnerConfirmation
        ) {
            let to = match response {
                BookingResponse::Accept => BookingStatus::PartnerAccepted,
                BookingResponse::Reject => BookingStatus::PartnerRejected,
            };
            return Err(DomainError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        match response {
            BookingResponse::Accept => self.transition(BookingStatus::PartnerAccepted),
            BookingResponse::Reject => {
                let reason = reason
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .ok_or(DomainError::ReasonRequired)?;
                self.transition(BookingStatus::PartnerRejected)?;
                self.reject_reason = Some(reason.to_string());
                Ok(())
            }
        }
    }

    /// Direct confirmation, allowed before or after payment
    pub fn confirm(&mut self) -> Result<(), DomainError> {
        if !matches!(
            self.status,
            BookingStatus::Pending | BookingStatus::PaidWaitingPartnerConfirmation
        ) {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: BookingStatus::Confirmed.to_string(),
            });
        }
        self.transition(BookingStatus::Confirmed)
    }

    /// Whether a payment may still be started for this booking
    pub fn awaiting_payment(&self) -> bool {
        matches!(
            self.status,
            BookingStatus::Pending | BookingStatus::PendingPayment
        )
    }
}

/// Merchant order number: `PEI` + `yyyyMMddHHmmss` + four random digits
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix = rand::thread_rng().gen_range(1000..=9999);
    format!("PEI{}{suffix}", now.format("%Y%m%d%H%M%S"))
}

/// Snapshot of whether a partner is in a session right now
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusyStatus {
    pub is_busy: bool,
    pub booking_id: Option<Snowflake>,
    pub end_time: Option<DateTime<Utc>>,
    pub remaining_minutes: Option<i64>,
}

impl BusyStatus {
    pub fn from_current(current: Option<&Booking>, now: DateTime<Utc>) -> Self {
        match current {
            Some(booking) => Self {
                is_busy: true,
                booking_id: Some(booking.id),
                end_time: Some(booking.end_time),
                remaining_minutes: Some(booking.window().remaining_minutes(now)),
            },
            None => Self {
                is_busy: false,
                booking_id: None,
                end_time: None,
                remaining_minutes: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn booking(status: BookingStatus) -> Booking {
        let now = Utc::now();
        Booking {
            id: Snowflake::new(10),
            customer_id: Snowflake::new(20),
            customer_user_id: Snowflake::new(21),
            schedule_id: Snowflake::new(30),
            partner_id: Snowflake::new(40),
            partner_user_id: Snowflake::new(41),
            start_time: now,
            end_time: now + Duration::hours(1),
            status,
            original_amount: Decimal::from(300),
            final_amount: Decimal::from(270),
            promo_code_id: None,
            order_number: None,
            is_instant: false,
            reject_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_terminal_statuses_have_no_successors() {
        for status in BookingStatus::ALL {
            if status.is_terminal() {
                assert!(status.successors().is_empty(), "{status} should be terminal");
            } else {
                assert!(!status.successors().is_empty(), "{status} should move on");
            }
        }
    }

    #[test]
    fn test_status_strings_round_trip() {
        for status in BookingStatus::ALL {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("UNKNOWN"), None);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut b = booking(BookingStatus::PendingPayment);
        assert_eq!(b.cancel().unwrap(), CancelOutcome::Cancelled);
        assert_eq!(b.cancel().unwrap(), CancelOutcome::AlreadyCancelled);
        assert_eq!(b.status, BookingStatus::Cancelled);
    }

    #[test]
    fn test_cannot_cancel_completed() {
        let mut b = booking(BookingStatus::Completed);
        assert!(matches!(
            b.cancel(),
            Err(DomainError::InvalidStatusTransition { .. })
        ));
    }

    #[test]
    fn test_reject_requires_reason() {
        let mut b = booking(BookingStatus::PaidWaitingPartnerConfirmation);
        assert!(matches!(
            b.respond(BookingResponse::Reject, Some("   ")),
            Err(DomainError::ReasonRequired)
        ));
        b.respond(BookingResponse::Reject, Some("sick")).unwrap();
        assert_eq!(b.status, BookingStatus::PartnerRejected);
        assert_eq!(b.reject_reason.as_deref(), Some("sick"));
    }

    #[test]
    fn test_accept_from_confirmed_is_rejected() {
        let mut b = booking(BookingStatus::Confirmed);
        assert!(b.respond(BookingResponse::Accept, None).is_err());
        let mut b = booking(BookingStatus::PendingPayment);
        b.respond(BookingResponse::Accept, None).unwrap();
        assert_eq!(b.status, BookingStatus::PartnerAccepted);
    }

    #[test]
    fn test_confirm_only_from_pending_or_paid() {
        assert!(booking(BookingStatus::Pending).confirm().is_ok());
        assert!(booking(BookingStatus::PaidWaitingPartnerConfirmation)
            .confirm()
            .is_ok());
        assert!(booking(BookingStatus::PendingPayment).confirm().is_err());
    }

    #[test]
    fn test_discount_amount() {
        assert_eq!(booking(BookingStatus::Pending).discount_amount(), Decimal::from(30));
    }

    #[test]
    fn test_order_number_format() {
        let n = generate_order_number(Utc::now());
        assert!(n.starts_with("PEI"));
        assert_eq!(n.len(), 3 + 14 + 4);
        assert!(n[3..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_busy_status() {
        let b = booking(BookingStatus::Confirmed);
        let status = BusyStatus::from_current(Some(&b), b.start_time + Duration::minutes(20));
        assert!(status.is_busy);
        assert_eq!(status.remaining_minutes, Some(40));
        assert!(!BusyStatus::from_current(None, Utc::now()).is_busy);
    }
}

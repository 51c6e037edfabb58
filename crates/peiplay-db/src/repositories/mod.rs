//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in peiplay-core.
//! Every repository shares the pool and one [`DbResilience`] so the circuit
//! breaker sees the health of the database as a whole.

mod announcement;
mod booking;
mod chat;
mod coin;
mod customer;
mod error;
mod favorite;
mod gift;
mod notification;
mod partner;
mod payment;
mod promo_code;
mod referral;
mod review;
mod schedule;
mod user;
mod withdrawal;

pub use announcement::PgAnnouncementRepository;
pub use booking::PgBookingRepository;
pub use chat::PgChatRepository;
pub use coin::PgCoinRepository;
pub use customer::PgCustomerRepository;
pub use error::{is_transient, map_db_error};
pub use favorite::PgFavoriteRepository;
pub use gift::PgGiftRepository;
pub use notification::PgNotificationRepository;
pub use partner::PgPartnerRepository;
pub use payment::PgPaymentRepository;
pub use promo_code::PgPromoCodeRepository;
pub use referral::PgReferralRepository;
pub use review::PgReviewRepository;
pub use schedule::PgScheduleRepository;
pub use user::PgUserRepository;
pub use withdrawal::PgWithdrawalRepository;

use peiplay_core::BookingStatus;

/// Status strings that no longer hold a schedule, bound as `TEXT[]`
pub(crate) fn terminal_statuses() -> Vec<&'static str> {
    BookingStatus::ALL
        .into_iter()
        .filter(|s| s.is_terminal())
        .map(BookingStatus::as_str)
        .collect()
}

/// Booking columns joined with schedule, partner, and customer ownership
pub(crate) const SELECT_BOOKING: &str = r"
    SELECT b.id, b.customer_id, c.user_id AS customer_user_id, b.schedule_id, s.partner_id,
           p.user_id AS partner_user_id, s.start_time, s.end_time, b.status,
           b.original_amount, b.final_amount, b.promo_code_id, b.order_number, b.is_instant,
           b.reject_reason, b.created_at, b.updated_at
    FROM bookings b
    JOIN schedules s ON s.id = b.schedule_id
    JOIN partners p ON p.id = s.partner_id
    JOIN customers c ON c.id = b.customer_id
";

/// Partner columns, unprefixed
pub(crate) const PARTNER_COLUMNS: &str = r"
    id, user_id, name, games, half_hourly_rate, status, customer_message, is_available_now,
    available_now_since, invite_code, invited_by, referral_count, referral_earnings,
    created_at, updated_at
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        let statuses = terminal_statuses();
        assert_eq!(statuses.len(), 5);
        assert!(statuses.contains(&"CANCELLED"));
        assert!(statuses.contains(&"COMPLETED_WITH_AMOUNT_MISMATCH"));
        assert!(!statuses.contains(&"PENDING_PAYMENT"));
    }
}

//! Route definitions
//!
//! All API routes organized by area and mounted under /api/v1.

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::handlers::{
    admin, announcements, auth, bookings, chat, coins, cron, favorites, gifts, health,
    notifications, partners, payments, promo, referrals, reviews, schedules, withdrawals,
};
use crate::state::AppState;

/// Create the main API router (health is exported separately so it can skip rate limiting)
pub fn create_router() -> Router<AppState> {
    Router::new().nest("/api/v1", api_v1_routes())
}

/// Health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}

fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .merge(partner_routes())
        .merge(schedule_routes())
        .merge(booking_routes())
        .merge(payment_routes())
        .merge(wallet_routes())
        .merge(referral_routes())
        .merge(review_routes())
        .merge(chat_routes())
        .merge(notification_routes())
        .merge(admin_routes())
        .merge(cron_routes())
}

/// Authentication routes
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh_token))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/auth/change-password", post(auth::change_password))
}

/// Partner directory and self-service
fn partner_routes() -> Router<AppState> {
    Router::new()
        .route("/partners", get(partners::list_partners))
        .route("/partners/apply", post(partners::apply))
        .route(
            "/partners/self",
            get(partners::get_self).patch(partners::update_self),
        )
        .route(
            "/partners/self/availability",
            put(partners::set_availability),
        )
        .route("/partners/:partner_id", get(partners::get_partner))
        .route("/partners/:partner_id/schedules", get(partners::get_schedules))
        .route("/partners/:partner_id/busy", get(partners::busy_status))
        .route("/partners/:partner_id/rating", get(partners::average_rating))
        .route("/favorites", get(favorites::list))
        .route(
            "/favorites/:partner_id",
            put(favorites::add).delete(favorites::remove),
        )
}

fn schedule_routes() -> Router<AppState> {
    Router::new()
        .route("/schedules", get(schedules::list_mine).post(schedules::create))
        .route("/schedules/batch", post(schedules::create_batch))
        .route("/schedules/:schedule_id", delete(schedules::delete))
}

/// Booking lifecycle
fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", get(bookings::list_mine).post(bookings::create))
        .route("/bookings/instant", post(bookings::instant))
        .route("/bookings/:booking_id", get(bookings::get))
        .route("/bookings/:booking_id/cancel", post(bookings::cancel))
        .route("/bookings/:booking_id/respond", post(bookings::respond))
        .route("/bookings/:booking_id/accept", post(bookings::accept))
}

/// Checkout and the gateway callback
fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/payment/create", post(payments::create_order))
        .route("/payment/callback", post(payments::callback))
}

/// Coins, gifts, promo codes and withdrawals
fn wallet_routes() -> Router<AppState> {
    Router::new()
        .route("/coins", get(coins::balance))
        .route("/coins/transactions", get(coins::transactions))
        .route("/coins/recharge", post(coins::recharge))
        .route("/promo-codes/validate", post(promo::validate))
        .route("/gifts", get(gifts::list))
        .route("/gifts/send", post(gifts::send))
        .route("/gifts/received", get(gifts::received))
        .route("/partners/withdrawal/request", post(withdrawals::request))
        .route("/partners/withdrawal/history", get(withdrawals::history))
}

fn referral_routes() -> Router<AppState> {
    Router::new()
        .route("/partners/referral/generate-code", post(referrals::generate_code))
        .route("/partners/referral/validate-code", get(referrals::validate_code))
        .route("/partners/referral/apply", post(referrals::apply_code))
        .route("/partners/referral/stats", get(referrals::stats))
}

fn review_routes() -> Router<AppState> {
    Router::new().route("/reviews", get(reviews::list).post(reviews::create))
}

/// Booking and free chat rooms
fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/chat/rooms", get(chat::rooms).post(chat::ensure_room))
        .route("/chat/rooms/free-chat", post(chat::free_chat))
        .route(
            "/chat/rooms/:room_id/messages",
            get(chat::messages).post(chat::send),
        )
        .route("/chat/rooms/:room_id/read", post(chat::mark_read))
        .route("/chat/unread-count", get(chat::unread_count))
}

fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(notifications::list))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route("/notifications/:notification_id/read", post(notifications::mark_read))
        .route(
            "/notifications/:notification_id",
            delete(notifications::delete),
        )
        .route("/announcements", get(announcements::list_active))
}

/// Back-office routes; every handler checks the ADMIN role
fn admin_routes() -> Router<AppState> {
    Router::new()
        // Users
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/:user_id", delete(admin::delete_user))
        .route("/admin/users/:user_id/suspend", post(admin::suspend_user))
        .route("/admin/users/:user_id/unsuspend", post(admin::unsuspend_user))
        .route("/admin/users/:user_id/verify", post(admin::verify_user))
        // Partner applications
        .route("/admin/partners", get(admin::list_partners))
        .route("/admin/partners/:partner_id/review", post(admin::review_partner))
        // Promo codes
        .route(
            "/admin/promo-codes",
            get(admin::list_promo_codes).post(admin::create_promo_code),
        )
        .route(
            "/admin/promo-codes/:promo_id",
            patch(admin::update_promo_code).delete(admin::delete_promo_code),
        )
        .route("/admin/promo-codes/:promo_id/toggle", post(admin::toggle_promo_code))
        // Coins and withdrawals
        .route("/admin/coins/add", post(admin::add_coins))
        .route("/admin/withdrawals", get(admin::list_withdrawals))
        .route(
            "/admin/withdrawals/:withdrawal_id/process",
            post(admin::process_withdrawal),
        )
        // Review moderation
        .route("/admin/reviews", get(admin::pending_reviews))
        .route("/admin/reviews/:review_id/moderate", post(admin::moderate_review))
        // Notifications and announcements
        .route("/admin/notifications", post(admin::send_notification))
        .route(
            "/admin/announcements",
            get(admin::list_announcements).post(admin::create_announcement),
        )
        .route(
            "/admin/announcements/:announcement_id",
            patch(admin::update_announcement),
        )
        .route(
            "/admin/announcements/:announcement_id/deactivate",
            post(admin::deactivate_announcement),
        )
}

/// Sweeps triggered by an external scheduler; both verbs are accepted
fn cron_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/cron/auto-close-available",
            get(cron::auto_close_available).post(cron::auto_close_available),
        )
        .route(
            "/cron/complete-bookings",
            get(cron::complete_bookings).post(cron::complete_bookings),
        )
        .route(
            "/cron/calculate-referral-earnings",
            get(cron::calculate_referral_earnings).post(cron::calculate_referral_earnings),
        )
}

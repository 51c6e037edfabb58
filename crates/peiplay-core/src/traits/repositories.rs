//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs and the infrastructure layer
//! provides the implementation. Operations that must be atomic (booking,
//! cancelling, gifting, withdrawing) are single methods so the implementation
//! can run them inside one database transaction.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::entities::{
    Announcement, Booking, BookingStatus, CancelOutcome, ChatMember, ChatMessage, ChatRoom,
    ChatRoomSummary, CoinTransaction, CoinTransactionType, Customer, EarningsSummary, GiftItem,
    GiftRecord, GiftSend, Notification, Partner, PartnerEarnings, PartnerStatus, Payment,
    PaymentCallback, PromoCode, RatingSummary, RechargeRecord, ReferralInvitee, ReferralOutcome,
    ReferralRecord, Review, Schedule, User, UserCoins, UserRole, WithdrawalBalance,
    WithdrawalRequest, WithdrawalStatus,
};
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// User Repository
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    pub role: Option<UserRole>,
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    async fn email_exists(&self, email: &str) -> RepoResult<bool>;

    /// Create the account and its customer profile atomically
    async fn create_with_customer(
        &self,
        user: &User,
        customer: &Customer,
        password_hash: &str,
    ) -> RepoResult<()>;

    async fn get_password_hash(&self, id: Snowflake) -> RepoResult<Option<String>>;

    async fn update_password(&self, id: Snowflake, password_hash: &str) -> RepoResult<()>;

    /// Persist suspension fields (`is_suspended`, reason, end date)
    async fn update_suspension(&self, user: &User) -> RepoResult<()>;

    async fn set_email_verified(&self, id: Snowflake, verified: bool) -> RepoResult<()>;

    /// Soft delete
    async fn delete(&self, id: Snowflake) -> RepoResult<()>;

    async fn list(&self, query: &UserQuery) -> RepoResult<Vec<User>>;

    async fn count(&self, query: &UserQuery) -> RepoResult<i64>;

    async fn find_admin_ids(&self) -> RepoResult<Vec<Snowflake>>;
}

// ============================================================================
// Customer Repository
// ============================================================================

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Customer>>;

    async fn find_by_user(&self, user_id: Snowflake) -> RepoResult<Option<Customer>>;
}

// ============================================================================
// Partner Repository
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct PartnerQuery {
    pub status: Option<PartnerStatus>,
    pub game: Option<String>,
    pub available_now: Option<bool>,
    pub limit: i64,
    pub offset: i64,
}

#[async_trait]
pub trait PartnerRepository: Send + Sync {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Partner>>;

    async fn find_by_user(&self, user_id: Snowflake) -> RepoResult<Option<Partner>>;

    async fn find_by_invite_code(&self, code: &str) -> RepoResult<Option<Partner>>;

    /// Fails with `PartnerProfileExists` if the user already applied
    async fn create(&self, partner: &Partner) -> RepoResult<()>;

    /// Name, games, rate, and customer message
    async fn update_profile(&self, partner: &Partner) -> RepoResult<()>;

    async fn set_availability(
        &self,
        id: Snowflake,
        available: bool,
        since: Option<DateTime<Utc>>,
    ) -> RepoResult<()>;

    /// Approved partners whose account is not currently suspended
    async fn list_public(&self, query: &PartnerQuery, now: DateTime<Utc>)
        -> RepoResult<Vec<Partner>>;

    async fn list(&self, query: &PartnerQuery) -> RepoResult<Vec<Partner>>;

    /// Set the review outcome; approval also promotes the user to `PARTNER`
    async fn review(&self, id: Snowflake, status: PartnerStatus) -> RepoResult<Partner>;

    /// Switch off every availability flag raised before `cutoff`
    async fn close_lapsed_availability(&self, cutoff: DateTime<Utc>) -> RepoResult<Vec<Partner>>;

    /// Fails with `ReferralCodeTaken` on collision
    async fn set_invite_code(&self, id: Snowflake, code: &str) -> RepoResult<()>;
}

// ============================================================================
// Schedule Repository
// ============================================================================

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Schedule>>;

    async fn find_by_partner(
        &self,
        partner_id: Snowflake,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> RepoResult<Vec<Schedule>>;

    /// Available schedules starting after `from` with no active booking
    async fn find_bookable(
        &self,
        partner_id: Snowflake,
        from: DateTime<Utc>,
        to: Option<DateTime<Utc>>,
    ) -> RepoResult<Vec<Schedule>>;

    async fn find_on_dates(
        &self,
        partner_id: Snowflake,
        dates: &[NaiveDate],
    ) -> RepoResult<Vec<Schedule>>;

    /// All-or-nothing insert; any overlap fails with `ScheduleConflict`
    async fn insert_all(&self, schedules: &[Schedule]) -> RepoResult<()>;

    /// Insert what fits, skipping duplicates and overlaps; returns inserted IDs
    async fn insert_skipping_conflicts(&self, schedules: &[Schedule])
        -> RepoResult<Vec<Snowflake>>;

    /// Fails with `ScheduleHasActiveBooking` while a booking holds the slot
    async fn delete(&self, id: Snowflake) -> RepoResult<()>;
}

// ============================================================================
// Booking Repository
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct BookingQuery {
    pub customer_id: Option<Snowflake>,
    pub partner_id: Option<Snowflake>,
    pub status: Option<BookingStatus>,
    pub limit: i64,
    pub offset: i64,
}

/// Input for one booking request covering one or more schedules
#[derive(Debug, Clone)]
pub struct NewBookings {
    pub customer_id: Snowflake,
    pub schedule_ids: Vec<Snowflake>,
    /// Pre-generated IDs, one per schedule
    pub booking_ids: Vec<Snowflake>,
    /// Pre-generated merchant order numbers, one per schedule
    pub order_numbers: Vec<String>,
    pub promo_code: Option<String>,
    /// Slot created in the same transaction for instant bookings
    pub instant_schedule: Option<Schedule>,
    pub now: DateTime<Utc>,
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Booking>>;

    async fn find_by_order_number(&self, order_number: &str) -> RepoResult<Option<Booking>>;

    async fn list(&self, query: &BookingQuery) -> RepoResult<Vec<Booking>>;

    async fn count(&self, query: &BookingQuery) -> RepoResult<i64>;

    /// Lock schedules, check conflicts, price, apply promo, and insert
    async fn create(&self, request: &NewBookings) -> RepoResult<Vec<Booking>>;

    /// Cancel under a row lock and record the cancellation
    async fn cancel(
        &self,
        id: Snowflake,
        cancellation_id: Snowflake,
        reason: Option<&str>,
    ) -> RepoResult<(Booking, CancelOutcome)>;

    /// Persist a status change made on `booking`, guarded by `expected`
    async fn save_status(&self, booking: &Booking, expected: BookingStatus) -> RepoResult<()>;

    async fn set_order_number(&self, id: Snowflake, order_number: &str) -> RepoResult<()>;

    /// A confirmed or accepted booking whose window contains `now`
    async fn find_current_for_partner(
        &self,
        partner_id: Snowflake,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<Booking>>;

    /// Mark every due confirmed/accepted booking completed
    async fn complete_due(&self, now: DateTime<Utc>) -> RepoResult<Vec<Booking>>;
}

// ============================================================================
// Payment Repository
// ============================================================================

#[derive(Debug, Clone)]
pub struct CallbackOutcome {
    pub booking: Booking,
    pub payment: Payment,
    /// True only when this callback moved the booking to paid
    pub transitioned: bool,
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Upsert by trade number and advance the booking on success
    async fn record_callback(&self, callback: &PaymentCallback) -> RepoResult<CallbackOutcome>;

    async fn find_by_booking(&self, booking_id: Snowflake) -> RepoResult<Vec<Payment>>;
}

// ============================================================================
// Promo Code Repository
// ============================================================================

#[async_trait]
pub trait PromoCodeRepository: Send + Sync {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<PromoCode>>;

    /// `code` must already be normalized
    async fn find_by_code(&self, code: &str) -> RepoResult<Option<PromoCode>>;

    async fn list(&self, limit: i64, offset: i64) -> RepoResult<Vec<PromoCode>>;

    async fn create(&self, promo: &PromoCode) -> RepoResult<()>;

    async fn update(&self, promo: &PromoCode) -> RepoResult<()>;

    async fn delete(&self, id: Snowflake) -> RepoResult<()>;

    async fn set_active(&self, id: Snowflake, active: bool) -> RepoResult<PromoCode>;
}

// ============================================================================
// Coin Repository
// ============================================================================

#[async_trait]
pub trait CoinRepository: Send + Sync {
    /// Wallet row, created on first access
    async fn get_or_create(&self, user_id: Snowflake) -> RepoResult<UserCoins>;

    async fn transactions(
        &self,
        user_id: Snowflake,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<CoinTransaction>>;

    async fn count_transactions(&self, user_id: Snowflake) -> RepoResult<i64>;

    async fn create_recharge(&self, record: &RechargeRecord) -> RepoResult<()>;

    async fn find_recharge(&self, order_number: &str) -> RepoResult<Option<RechargeRecord>>;

    /// Credit a pending recharge once; `None` if it was already completed
    async fn complete_recharge(
        &self,
        order_number: &str,
        transaction_id: Snowflake,
    ) -> RepoResult<Option<CoinTransaction>>;

    /// Credit `amount` coins and append a ledger entry
    async fn credit(
        &self,
        user_id: Snowflake,
        amount: i64,
        kind: CoinTransactionType,
        description: Option<&str>,
        transaction_id: Snowflake,
    ) -> RepoResult<CoinTransaction>;
}

// ============================================================================
// Gift Repository
// ============================================================================

#[async_trait]
pub trait GiftRepository: Send + Sync {
    async fn list_active(&self) -> RepoResult<Vec<GiftItem>>;

    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<GiftItem>>;

    /// Debit sender, credit partner earnings, and record the gift atomically
    async fn send(&self, gift: &GiftSend) -> RepoResult<(GiftRecord, CoinTransaction)>;

    async fn received_by_partner(
        &self,
        partner_id: Snowflake,
        limit: i64,
    ) -> RepoResult<Vec<GiftRecord>>;

    async fn earnings(&self, partner_id: Snowflake) -> RepoResult<PartnerEarnings>;
}

// ============================================================================
// Withdrawal Repository
// ============================================================================

#[async_trait]
pub trait WithdrawalRepository: Send + Sync {
    async fn earnings_summary(&self, partner_id: Snowflake) -> RepoResult<EarningsSummary>;

    /// Lock the partner, recompute the balance, and insert the request
    async fn create_checked(
        &self,
        request: &WithdrawalRequest,
        platform_fee_rate: Decimal,
    ) -> RepoResult<WithdrawalBalance>;

    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<WithdrawalRequest>>;

    async fn list_by_partner(&self, partner_id: Snowflake) -> RepoResult<Vec<WithdrawalRequest>>;

    async fn list(
        &self,
        status: Option<WithdrawalStatus>,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<WithdrawalRequest>>;

    /// Persist a processed request, guarded by the status it was read with
    async fn save_processed(
        &self,
        request: &WithdrawalRequest,
        expected: WithdrawalStatus,
    ) -> RepoResult<()>;
}

// ============================================================================
// Referral Repository
// ============================================================================

#[async_trait]
pub trait ReferralRepository: Send + Sync {
    async fn find_by_invitee(&self, invitee_id: Snowflake) -> RepoResult<Option<ReferralRecord>>;

    /// Insert the record and bump the inviter's referral count
    async fn create(&self, record: &ReferralRecord) -> RepoResult<()>;

    async fn invitees(&self, inviter_id: Snowflake) -> RepoResult<Vec<ReferralInvitee>>;

    /// Idempotent per booking
    async fn calculate_for_booking(
        &self,
        booking_id: Snowflake,
        earning_id: Snowflake,
    ) -> RepoResult<ReferralOutcome>;

    /// Completed bookings since `since` that have no earning row yet
    async fn bookings_pending_calculation(
        &self,
        since: DateTime<Utc>,
    ) -> RepoResult<Vec<Snowflake>>;
}

// ============================================================================
// Review Repository
// ============================================================================

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Fails with `AlreadyReviewed` on a duplicate (booking, reviewer)
    async fn create(&self, review: &Review) -> RepoResult<()>;

    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Review>>;

    async fn exists(&self, booking_id: Snowflake, reviewer_id: Snowflake) -> RepoResult<bool>;

    async fn list_by_reviewee(
        &self,
        reviewee_id: Snowflake,
        include_unapproved: bool,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<Review>>;

    async fn list_by_booking(
        &self,
        booking_id: Snowflake,
        include_unapproved: bool,
    ) -> RepoResult<Vec<Review>>;

    async fn list_pending(&self, limit: i64, offset: i64) -> RepoResult<Vec<Review>>;

    async fn approve(&self, id: Snowflake) -> RepoResult<()>;

    async fn delete(&self, id: Snowflake) -> RepoResult<()>;

    async fn rating_summary(&self, reviewee_id: Snowflake) -> RepoResult<RatingSummary>;
}

// ============================================================================
// Chat Repository
// ============================================================================

#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn find_room(&self, id: Snowflake) -> RepoResult<Option<ChatRoom>>;

    async fn find_room_by_booking(&self, booking_id: Snowflake) -> RepoResult<Option<ChatRoom>>;

    /// Booking-less one-on-one room whose only members are `a` and `b`
    async fn find_free_room(&self, a: Snowflake, b: Snowflake) -> RepoResult<Option<ChatRoom>>;

    async fn member_ids(&self, room_id: Snowflake) -> RepoResult<Vec<Snowflake>>;

    /// Create the room with its members; returns the existing room on a race
    async fn create_room(&self, room: &ChatRoom, members: &[Snowflake]) -> RepoResult<ChatRoom>;

    async fn find_member(
        &self,
        room_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<Option<ChatMember>>;

    async fn rooms_for_user(&self, user_id: Snowflake) -> RepoResult<Vec<ChatRoomSummary>>;

    /// Newest first, strictly older than `before` when given
    async fn messages(
        &self,
        room_id: Snowflake,
        before: Option<Snowflake>,
        limit: i64,
    ) -> RepoResult<Vec<ChatMessage>>;

    async fn count_sent_by(&self, room_id: Snowflake, sender_id: Snowflake) -> RepoResult<i64>;

    /// Insert and bump the room's `last_message_at`
    async fn create_message(&self, message: &ChatMessage) -> RepoResult<()>;

    async fn mark_read(
        &self,
        room_id: Snowflake,
        user_id: Snowflake,
        message_ids: &[Snowflake],
        now: DateTime<Utc>,
    ) -> RepoResult<()>;

    async fn unread_count(&self, user_id: Snowflake) -> RepoResult<i64>;
}

// ============================================================================
// Notification Repository
// ============================================================================

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: &Notification) -> RepoResult<()>;

    async fn list(
        &self,
        user_id: Snowflake,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<Notification>>;

    async fn count(&self, user_id: Snowflake) -> RepoResult<i64>;

    async fn unread_count(&self, user_id: Snowflake) -> RepoResult<i64>;

    async fn mark_all_read(&self, user_id: Snowflake) -> RepoResult<u64>;

    /// False when no visible notification matched
    async fn mark_read(&self, id: Snowflake, user_id: Snowflake) -> RepoResult<bool>;

    /// Soft delete; false when no visible notification matched
    async fn delete(&self, id: Snowflake, user_id: Snowflake) -> RepoResult<bool>;
}

// ============================================================================
// Announcement Repository
// ============================================================================

#[async_trait]
pub trait AnnouncementRepository: Send + Sync {
    async fn list_active(&self, now: DateTime<Utc>) -> RepoResult<Vec<Announcement>>;

    async fn list_all(&self, limit: i64, offset: i64) -> RepoResult<Vec<Announcement>>;

    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Announcement>>;

    async fn create(&self, announcement: &Announcement) -> RepoResult<()>;

    async fn update(&self, announcement: &Announcement) -> RepoResult<()>;
}

// ============================================================================
// Favorite Repository
// ============================================================================

#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    async fn list(&self, customer_id: Snowflake) -> RepoResult<Vec<Partner>>;

    /// No-op if already present
    async fn add(&self, customer_id: Snowflake, partner_id: Snowflake) -> RepoResult<()>;

    /// No-op if absent
    async fn remove(&self, customer_id: Snowflake, partner_id: Snowflake) -> RepoResult<()>;
}

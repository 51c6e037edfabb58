//! Domain errors - error types for the domain layer

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;

use crate::value_objects::{Snowflake, TimeRange};

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("User not found: {0}")]
    UserNotFound(Snowflake),

    #[error("Customer profile not found")]
    CustomerNotFound,

    #[error("Partner not found")]
    PartnerNotFound,

    #[error("Schedule not found: {0}")]
    ScheduleNotFound(Snowflake),

    #[error("Booking not found: {0}")]
    BookingNotFound(Snowflake),

    #[error("Promo code not found: {0}")]
    PromoCodeNotFound(String),

    #[error("Gift not found: {0}")]
    GiftNotFound(Snowflake),

    #[error("Withdrawal request not found: {0}")]
    WithdrawalNotFound(Snowflake),

    #[error("Review not found: {0}")]
    ReviewNotFound(Snowflake),

    #[error("Chat room not found: {0}")]
    ChatRoomNotFound(Snowflake),

    #[error("Notification not found: {0}")]
    NotificationNotFound(Snowflake),

    #[error("Announcement not found: {0}")]
    AnnouncementNotFound(Snowflake),

    #[error("Referral code not found: {0}")]
    ReferralCodeNotFound(String),

    #[error("Recharge order not found: {0}")]
    RechargeNotFound(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Password too weak: {0}")]
    WeakPassword(String),

    #[error("End time must be after start time on the schedule date")]
    InvalidTimeRange,

    #[error("A reason is required to reject a booking")]
    ReasonRequired,

    #[error("Message content cannot be empty")]
    EmptyMessage,

    #[error("Promo code is not active")]
    PromoCodeInactive,

    #[error("Promo code cannot be used for this partner")]
    PromoCodePartnerMismatch,

    #[error("Promo code has reached its usage limit")]
    PromoCodeExhausted,

    #[error("Promo code is not valid yet")]
    PromoCodeNotYetValid,

    #[error("Promo code has expired")]
    PromoCodeExpired,

    #[error("Insufficient coins: balance {balance}, required {required}")]
    InsufficientCoins { balance: i64, required: i64 },

    #[error("Insufficient balance: available {available}")]
    InsufficientBalance { available: Decimal },

    #[error("Booking must be completed before it can be reviewed")]
    BookingNotCompleted,

    #[error("Booking has already been reviewed")]
    AlreadyReviewed,

    #[error("Free chat is limited to {limit} messages")]
    FreeChatLimitReached { limit: i64 },

    #[error("Cannot use your own referral code")]
    OwnReferralCode,

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Administrator role required")]
    AdminRequired,

    #[error("Partner profile required")]
    PartnerRequired,

    #[error("Partner is not approved")]
    PartnerNotApproved,

    #[error("Not a member of this chat room")]
    NotRoomMember,

    #[error("Account suspended")]
    AccountSuspended { until: Option<DateTime<Utc>> },

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Email already in use")]
    EmailAlreadyExists,

    #[error("Partner profile already exists")]
    PartnerProfileExists,

    #[error("Schedule overlaps an existing schedule")]
    ScheduleConflict { schedule_ids: Vec<Snowflake> },

    #[error("Submitted schedules overlap each other")]
    OverlappingEntries { windows: Vec<(TimeRange, TimeRange)> },

    #[error("Schedule has an active booking")]
    ScheduleHasActiveBooking,

    #[error("Schedule is already booked")]
    BookingConflict { schedule_id: Snowflake },

    #[error("Partner already has a booking in this time range")]
    TimeConflict { schedule_id: Snowflake },

    #[error("Partner is currently busy")]
    PartnerBusy { until: Option<DateTime<Utc>> },

    #[error("Cannot move from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("A pending withdrawal request already exists")]
    PendingWithdrawalExists,

    #[error("Promo code already exists")]
    PromoCodeExists,

    #[error("Referral code already applied")]
    ReferralAlreadyApplied,

    #[error("Referral code already taken")]
    ReferralCodeTaken,

    // =========================================================================
    // Availability Errors
    // =========================================================================
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database unavailable: {0}")]
    DatabaseUnavailable(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::CustomerNotFound => "NO_CUSTOMER",
            Self::PartnerNotFound => "PARTNER_NOT_FOUND",
            Self::ScheduleNotFound(_) => "INVALID_SCHEDULE",
            Self::BookingNotFound(_) => "BOOKING_NOT_FOUND",
            Self::PromoCodeNotFound(_) => "PROMO_CODE_NOT_FOUND",
            Self::GiftNotFound(_) => "GIFT_NOT_FOUND",
            Self::WithdrawalNotFound(_) => "WITHDRAWAL_NOT_FOUND",
            Self::ReviewNotFound(_) => "REVIEW_NOT_FOUND",
            Self::ChatRoomNotFound(_) => "CHAT_ROOM_NOT_FOUND",
            Self::NotificationNotFound(_) => "NOTIFICATION_NOT_FOUND",
            Self::AnnouncementNotFound(_) => "ANNOUNCEMENT_NOT_FOUND",
            Self::ReferralCodeNotFound(_) => "REFERRAL_CODE_NOT_FOUND",
            Self::RechargeNotFound(_) => "RECHARGE_NOT_FOUND",
            Self::OrderNotFound(_) => "ORDER_NOT_FOUND",

            // Validation
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::WeakPassword(_) => "WEAK_PASSWORD",
            Self::InvalidTimeRange => "INVALID_TIME_RANGE",
            Self::ReasonRequired => "REASON_REQUIRED",
            Self::EmptyMessage => "EMPTY_MESSAGE",
            Self::PromoCodeInactive => "PROMO_CODE_INACTIVE",
            Self::PromoCodePartnerMismatch => "PROMO_CODE_PARTNER_MISMATCH",
            Self::PromoCodeExhausted => "PROMO_CODE_EXHAUSTED",
            Self::PromoCodeNotYetValid => "PROMO_CODE_NOT_YET_VALID",
            Self::PromoCodeExpired => "PROMO_CODE_EXPIRED",
            Self::InsufficientCoins { .. } => "INSUFFICIENT_COINS",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::BookingNotCompleted => "BOOKING_NOT_COMPLETED",
            Self::AlreadyReviewed => "ALREADY_REVIEWED",
            Self::FreeChatLimitReached { .. } => "FREE_CHAT_LIMIT",
            Self::OwnReferralCode => "OWN_REFERRAL_CODE",

            // Authorization
            Self::Forbidden(_) => "FORBIDDEN",
            Self::AdminRequired => "ADMIN_REQUIRED",
            Self::PartnerRequired => "PARTNER_REQUIRED",
            Self::PartnerNotApproved => "PARTNER_NOT_APPROVED",
            Self::NotRoomMember => "NOT_ROOM_MEMBER",
            Self::AccountSuspended { .. } => "ACCOUNT_SUSPENDED",

            // Conflict
            Self::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            Self::PartnerProfileExists => "PARTNER_PROFILE_EXISTS",
            Self::ScheduleConflict { .. } | Self::OverlappingEntries { .. } => "SCHEDULE_CONFLICT",
            Self::ScheduleHasActiveBooking => "SCHEDULE_HAS_ACTIVE_BOOKING",
            Self::BookingConflict { .. } => "BOOKING_CONFLICT",
            Self::TimeConflict { .. } => "TIME_CONFLICT",
            Self::PartnerBusy { .. } => "PARTNER_BUSY",
            Self::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            Self::PendingWithdrawalExists => "PENDING_WITHDRAWAL_EXISTS",
            Self::PromoCodeExists => "PROMO_CODE_EXISTS",
            Self::ReferralAlreadyApplied => "REFERRAL_ALREADY_APPLIED",
            Self::ReferralCodeTaken => "REFERRAL_CODE_TAKEN",

            // Availability
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",

            // Infrastructure
            Self::DatabaseUnavailable(_) | Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::CacheError(_) => "CACHE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Structured context attached to the error payload, if any
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::ScheduleConflict { schedule_ids } => Some(json!({
                "existing_schedule_id": schedule_ids.first(),
                "conflicts": schedule_ids,
            })),
            Self::OverlappingEntries { windows } => Some(json!({
                "conflicts": [],
                "overlapping_entries": windows
                    .iter()
                    .map(|(a, b)| json!([a, b]))
                    .collect::<Vec<_>>(),
            })),
            Self::BookingConflict { schedule_id } => {
                Some(json!({ "conflicting_schedule_id": schedule_id }))
            }
            Self::TimeConflict { schedule_id } => {
                Some(json!({ "conflicting_schedule_id": schedule_id }))
            }
            Self::PartnerBusy { until: Some(until) } => Some(json!({ "busy_until": until })),
            Self::AccountSuspended { until } => Some(json!({ "suspension_ends_at": until })),
            Self::InsufficientBalance { available } => {
                Some(json!({ "available_balance": available }))
            }
            Self::InsufficientCoins { balance, required } => {
                Some(json!({ "balance": balance, "required": required }))
            }
            _ => None,
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound(_)
                | Self::CustomerNotFound
                | Self::PartnerNotFound
                | Self::ScheduleNotFound(_)
                | Self::BookingNotFound(_)
                | Self::PromoCodeNotFound(_)
                | Self::GiftNotFound(_)
                | Self::WithdrawalNotFound(_)
                | Self::ReviewNotFound(_)
                | Self::ChatRoomNotFound(_)
                | Self::NotificationNotFound(_)
                | Self::AnnouncementNotFound(_)
                | Self::ReferralCodeNotFound(_)
                | Self::RechargeNotFound(_)
                | Self::OrderNotFound(_)
        )
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::InvalidEmail
                | Self::WeakPassword(_)
                | Self::InvalidTimeRange
                | Self::ReasonRequired
                | Self::EmptyMessage
                | Self::PromoCodeInactive
                | Self::PromoCodePartnerMismatch
                | Self::PromoCodeExhausted
                | Self::PromoCodeNotYetValid
                | Self::PromoCodeExpired
                | Self::InsufficientCoins { .. }
                | Self::InsufficientBalance { .. }
                | Self::BookingNotCompleted
                | Self::AlreadyReviewed
                | Self::FreeChatLimitReached { .. }
                | Self::OwnReferralCode
        )
    }

    /// Check if this is an authorization error
    pub fn is_authorization(&self) -> bool {
        matches!(
            self,
            Self::Forbidden(_)
                | Self::AdminRequired
                | Self::PartnerRequired
                | Self::PartnerNotApproved
                | Self::NotRoomMember
                | Self::AccountSuspended { .. }
        )
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::EmailAlreadyExists
                | Self::PartnerProfileExists
                | Self::ScheduleConflict { .. }
                | Self::OverlappingEntries { .. }
                | Self::ScheduleHasActiveBooking
                | Self::BookingConflict { .. }
                | Self::TimeConflict { .. }
                | Self::PartnerBusy { .. }
                | Self::InvalidStatusTransition { .. }
                | Self::PendingWithdrawalExists
                | Self::PromoCodeExists
                | Self::ReferralAlreadyApplied
                | Self::ReferralCodeTaken
        )
    }

    /// Check if the backing store is temporarily unreachable
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::ServiceUnavailable(_) | Self::DatabaseUnavailable(_)
        )
    }

    /// Infrastructure failures that count against the database circuit breaker
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::DatabaseUnavailable(_) | Self::DatabaseError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_error_codes() {
        assert_eq!(DomainError::CustomerNotFound.code(), "NO_CUSTOMER");
        assert_eq!(
            DomainError::ScheduleNotFound(Snowflake::new(1)).code(),
            "INVALID_SCHEDULE"
        );
        assert_eq!(
            DomainError::TimeConflict {
                schedule_id: Snowflake::new(1)
            }
            .code(),
            "TIME_CONFLICT"
        );
    }

    #[test]
    fn test_classification() {
        assert!(DomainError::BookingNotFound(Snowflake::new(1)).is_not_found());
        assert!(DomainError::ReasonRequired.is_validation());
        assert!(DomainError::AdminRequired.is_authorization());
        assert!(DomainError::PendingWithdrawalExists.is_conflict());
        assert!(DomainError::ServiceUnavailable("db".into()).is_unavailable());
        assert!(!DomainError::PromoCodeExists.is_infrastructure());
        assert!(DomainError::DatabaseUnavailable("reset".into()).is_infrastructure());
    }

    #[test]
    fn test_conflict_details() {
        let err = DomainError::BookingConflict {
            schedule_id: Snowflake::new(77),
        };
        let details = err.details().unwrap();
        assert_eq!(details["conflicting_schedule_id"], "77");

        let err = DomainError::ScheduleConflict {
            schedule_ids: vec![Snowflake::new(5), Snowflake::new(6)],
        };
        assert_eq!(err.details().unwrap()["existing_schedule_id"], "5");
    }

    #[test]
    fn test_overlapping_entries_details() {
        let at = |h: u32| Utc.with_ymd_and_hms(2025, 6, 1, h, 0, 0).unwrap();
        let first = TimeRange::new(at(10), at(12)).unwrap();
        let second = TimeRange::new(at(11), at(13)).unwrap();
        let err = DomainError::OverlappingEntries {
            windows: vec![(first, second)],
        };

        assert_eq!(err.code(), "SCHEDULE_CONFLICT");
        assert!(err.is_conflict());
        let details = err.details().unwrap();
        let pair = &details["overlapping_entries"][0];
        assert_eq!(pair[0]["start"], serde_json::to_value(at(10)).unwrap());
        assert_eq!(pair[1]["end"], serde_json::to_value(at(13)).unwrap());
    }

    #[test]
    fn test_error_display() {
        let err = DomainError::InsufficientCoins {
            balance: 3,
            required: 10,
        };
        assert_eq!(err.to_string(), "Insufficient coins: balance 3, required 10");
    }
}

//! # peiplay-core
//!
//! Domain layer of the PeiPlay marketplace: entities, value objects, business
//! rules, repository traits, and domain events. Nothing in here talks to a
//! database, cache, or web framework.

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    Announcement, Booking, BookingResponse, BookingStatus, BusyStatus, CancelOutcome, ChatMember,
    ChatMessage, ChatRoom, ChatRoomSummary, ChatRoomType, CoinTransaction, CoinTransactionType,
    Customer, DiscountType, EarningsSummary, GiftItem, GiftRecord, GiftSend, MessageStatus,
    MessageType, ModerationStatus, Notification, NotificationType, Partner, PartnerEarnings,
    PartnerStatus, Payment, PaymentCallback, PaymentStatus, PromoCode, PromoDiscount,
    RatingSummary, RechargeRecord, RechargeStatus, ReferralEarning, ReferralInvitee,
    ReferralOutcome, ReferralRecord, Review, Schedule, ScheduleSlot, User, UserCoins, UserRole,
    WithdrawalBalance, WithdrawalRequest, WithdrawalStatus,
};
pub use error::DomainError;
pub use events::DomainEvent;
pub use traits::{
    AnnouncementRepository, BookingQuery, BookingRepository, CallbackOutcome, ChatRepository,
    CoinRepository, CustomerRepository, FavoriteRepository, GiftRepository, NewBookings,
    NotificationRepository, PartnerQuery, PartnerRepository, PaymentRepository,
    PromoCodeRepository, ReferralRepository, RepoResult, ReviewRepository, ScheduleRepository,
    UserQuery, UserRepository, WithdrawalRepository,
};
pub use value_objects::{Snowflake, SnowflakeGenerator, SnowflakeParseError, TimeRange};

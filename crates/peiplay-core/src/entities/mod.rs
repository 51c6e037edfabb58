//! Domain entities - core business objects and the rules that govern them

mod booking;
mod chat;
mod coin;
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

pub use booking::{
    generate_order_number, Booking, BookingResponse, BookingStatus, BusyStatus, CancelOutcome,
    MAX_SCHEDULES_PER_REQUEST,
};
pub use chat::{
    ChatMember, ChatMessage, ChatRoom, ChatRoomSummary, ChatRoomType, MessageStatus, MessageType,
    ModerationStatus, BLOCKED_KEYWORDS, MAX_MESSAGE_LENGTH,
};
pub use coin::{
    recharge_order_number, CoinTransaction, CoinTransactionType, RechargeRecord, RechargeStatus,
    UserCoins, MAX_RECHARGE_COINS,
};
pub use gift::{GiftItem, GiftRecord, GiftSend, PartnerEarnings};
pub use notification::{Announcement, Notification, NotificationType};
pub use partner::{Partner, PartnerStatus};
pub use payment::{Payment, PaymentCallback, PaymentStatus};
pub use promo_code::{DiscountType, PromoCode, PromoDiscount, UNLIMITED_USES};
pub use referral::{
    referral_commission, referral_percentage, ReferralEarning, ReferralInvitee, ReferralOutcome,
    ReferralRecord,
};
pub use review::{RatingSummary, Review};
pub use schedule::{
    overlapping_schedules, self_overlaps, Schedule, ScheduleSlot, MAX_RECURRING_WEEKS,
};
pub use user::{Customer, User, UserRole};
pub use withdrawal::{
    EarningsSummary, WithdrawalBalance, WithdrawalRequest, WithdrawalStatus,
};

//! Database models - SQLx-compatible structs for PostgreSQL tables
//!
//! Enum-valued columns are read as `TEXT` and parsed in the mappers.

mod booking;
mod chat;
mod coin;
mod gift;
mod notification;
mod partner;
mod promo_code;
mod referral;
mod review;
mod schedule;
mod user;
mod withdrawal;

pub use booking::{BookingModel, PaymentModel};
pub use chat::{ChatMemberModel, ChatMessageModel, ChatRoomModel, ChatRoomSummaryModel};
pub use coin::{CoinTransactionModel, RechargeRecordModel, UserCoinsModel};
pub use gift::{GiftItemModel, GiftRecordModel, PartnerEarningsModel};
pub use notification::{AnnouncementModel, NotificationModel};
pub use partner::PartnerModel;
pub use promo_code::PromoCodeModel;
pub use referral::{ReferralInviteeModel, ReferralRecordModel};
pub use review::{RatingSummaryModel, ReviewModel};
pub use schedule::ScheduleModel;
pub use user::{CustomerModel, UserModel};
pub use withdrawal::{EarningsSummaryModel, WithdrawalModel};

//! Business logic services
//!
//! Each service borrows the shared [`ServiceContext`] for the duration of one
//! request and orchestrates repositories, cache stores and event publishing.

pub mod access;
pub mod admin;
pub mod announcement;
pub mod auth;
pub mod booking;
pub mod chat;
pub mod coin;
pub mod context;
pub mod cron;
pub mod error;
pub mod favorite;
pub mod gift;
pub mod notification;
pub mod partner;
pub mod payment;
pub mod promo;
pub mod referral;
pub mod review;
pub mod schedule;
pub mod withdrawal;

// Re-export all services for convenience
pub use access::AccessService;
pub use admin::AdminUserService;
pub use announcement::AnnouncementService;
pub use auth::AuthService;
pub use booking::BookingService;
pub use chat::ChatService;
pub use coin::CoinService;
pub use context::{Repositories, ServiceContext, ServiceContextBuilder};
pub use cron::{authorize as authorize_cron, spawn_scheduler, CronService};
pub use error::{ServiceError, ServiceResult};
pub use favorite::FavoriteService;
pub use gift::GiftService;
pub use notification::NotificationService;
pub use partner::PartnerService;
pub use payment::{PaymentService, CALLBACK_ACK};
pub use promo::PromoService;
pub use referral::ReferralService;
pub use review::ReviewService;
pub use schedule::ScheduleService;
pub use withdrawal::WithdrawalService;

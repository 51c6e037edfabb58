//! # peiplay-db
//!
//! Database layer implementing the `peiplay-core` repository traits with
//! PostgreSQL via SQLx.
//!
//! - Connection pool and migrations
//! - Row models with SQLx `FromRow` derives
//! - Model → entity mappers
//! - Repository implementations, every call routed through [`DbResilience`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use peiplay_db::{create_pool, DbResilience, PgUserRepository};
//!
//! let pool = create_pool(&config.database).await?;
//! let resilience = Arc::new(DbResilience::new(&config.resilience));
//! let users = PgUserRepository::new(pool.clone(), resilience.clone());
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;
pub mod resilience;

// Re-export commonly used types
pub use pool::{create_pool, run_migrations, PgPool};
pub use repositories::{
    PgAnnouncementRepository, PgBookingRepository, PgChatRepository, PgCoinRepository,
    PgCustomerRepository, PgFavoriteRepository, PgGiftRepository, PgNotificationRepository,
    PgPartnerRepository, PgPaymentRepository, PgPromoCodeRepository, PgReferralRepository,
    PgReviewRepository, PgScheduleRepository, PgUserRepository, PgWithdrawalRepository,
};
pub use resilience::{BreakerState, DbResilience};

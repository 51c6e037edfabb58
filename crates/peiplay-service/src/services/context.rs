//! Service context - dependency container for services
//!
//! Holds all repositories, cache stores, and other dependencies needed by services.

use std::sync::Arc;

use peiplay_cache::{CronLock, Publisher, RefreshTokenStore, SharedRedisPool, UnreadCountCache};
use peiplay_common::{CronConfig, Environment, JwtService, PlatformConfig};
use peiplay_core::traits::{
    AnnouncementRepository, BookingRepository, ChatRepository, CoinRepository, CustomerRepository,
    FavoriteRepository, GiftRepository, NotificationRepository, PartnerRepository,
    PaymentRepository, PromoCodeRepository, ReferralRepository, ReviewRepository,
    ScheduleRepository, UserRepository, WithdrawalRepository,
};
use peiplay_core::{Snowflake, SnowflakeGenerator};
use peiplay_db::{DbResilience, PgPool};

use super::error::{ServiceError, ServiceResult};

/// Repository handles, grouped so the context constructor stays readable
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub customers: Arc<dyn CustomerRepository>,
    pub partners: Arc<dyn PartnerRepository>,
    pub schedules: Arc<dyn ScheduleRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub promo_codes: Arc<dyn PromoCodeRepository>,
    pub coins: Arc<dyn CoinRepository>,
    pub gifts: Arc<dyn GiftRepository>,
    pub withdrawals: Arc<dyn WithdrawalRepository>,
    pub referrals: Arc<dyn ReferralRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
    pub chat: Arc<dyn ChatRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub announcements: Arc<dyn AnnouncementRepository>,
    pub favorites: Arc<dyn FavoriteRepository>,
}

impl Repositories {
    /// Postgres implementations sharing one pool and one breaker
    pub fn postgres(pool: &PgPool, resilience: &Arc<DbResilience>) -> Self {
        use peiplay_db::{
            PgAnnouncementRepository, PgBookingRepository, PgChatRepository, PgCoinRepository,
            PgCustomerRepository, PgFavoriteRepository, PgGiftRepository,
            PgNotificationRepository, PgPartnerRepository, PgPaymentRepository,
            PgPromoCodeRepository, PgReferralRepository, PgReviewRepository,
            PgScheduleRepository, PgUserRepository, PgWithdrawalRepository,
        };

        let p = || pool.clone();
        let r = || Arc::clone(resilience);
        Self {
            users: Arc::new(PgUserRepository::new(p(), r())),
            customers: Arc::new(PgCustomerRepository::new(p(), r())),
            partners: Arc::new(PgPartnerRepository::new(p(), r())),
            schedules: Arc::new(PgScheduleRepository::new(p(), r())),
            bookings: Arc::new(PgBookingRepository::new(p(), r())),
            payments: Arc::new(PgPaymentRepository::new(p(), r())),
            promo_codes: Arc::new(PgPromoCodeRepository::new(p(), r())),
            coins: Arc::new(PgCoinRepository::new(p(), r())),
            gifts: Arc::new(PgGiftRepository::new(p(), r())),
            withdrawals: Arc::new(PgWithdrawalRepository::new(p(), r())),
            referrals: Arc::new(PgReferralRepository::new(p(), r())),
            reviews: Arc::new(PgReviewRepository::new(p(), r())),
            chat: Arc::new(PgChatRepository::new(p(), r())),
            notifications: Arc::new(PgNotificationRepository::new(p(), r())),
            announcements: Arc::new(PgAnnouncementRepository::new(p(), r())),
            favorites: Arc::new(PgFavoriteRepository::new(p(), r())),
        }
    }
}

/// Service context containing all dependencies
///
/// This is the main dependency container that gets passed to all services.
/// It provides access to:
/// - Database repositories and the shared circuit breaker
/// - Redis stores (refresh tokens, unread counts, cron locks)
/// - JWT service for authentication
/// - Snowflake generator for ID generation
/// - Redis pub/sub for events
/// - Marketplace constants
#[derive(Clone)]
pub struct ServiceContext {
    pool: PgPool,
    redis_pool: SharedRedisPool,
    resilience: Arc<DbResilience>,

    repos: Repositories,

    // Cache stores
    refresh_token_store: RefreshTokenStore,
    unread_counts: UnreadCountCache,
    cron_lock: CronLock,

    // Pub/Sub
    publisher: Publisher,

    jwt_service: Arc<JwtService>,
    snowflake_generator: Arc<SnowflakeGenerator>,

    platform: PlatformConfig,
    cron: CronConfig,
    environment: Environment,
}

impl ServiceContext {
    /// Create a new service context with all dependencies
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pool: PgPool,
        redis_pool: SharedRedisPool,
        resilience: Arc<DbResilience>,
        repos: Repositories,
        jwt_service: Arc<JwtService>,
        snowflake_generator: Arc<SnowflakeGenerator>,
        platform: PlatformConfig,
        cron: CronConfig,
        environment: Environment,
    ) -> Self {
        let inner_pool = (*redis_pool).clone();
        let refresh_token_store = RefreshTokenStore::new(inner_pool.clone());
        let unread_counts = UnreadCountCache::new(inner_pool.clone());
        let cron_lock = CronLock::new(inner_pool.clone());
        let publisher = Publisher::new(inner_pool);

        Self {
            pool,
            redis_pool,
            resilience,
            repos,
            refresh_token_store,
            unread_counts,
            cron_lock,
            publisher,
            jwt_service,
            snowflake_generator,
            platform,
            cron,
            environment,
        }
    }

    // === Pools ===

    /// Get the PostgreSQL connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get the Redis connection pool
    pub fn redis_pool(&self) -> &SharedRedisPool {
        &self.redis_pool
    }

    pub fn resilience(&self) -> &DbResilience {
        self.resilience.as_ref()
    }

    // === Repositories ===

    pub fn user_repo(&self) -> &dyn UserRepository {
        self.repos.users.as_ref()
    }

    pub fn customer_repo(&self) -> &dyn CustomerRepository {
        self.repos.customers.as_ref()
    }

    pub fn partner_repo(&self) -> &dyn PartnerRepository {
        self.repos.partners.as_ref()
    }

    pub fn schedule_repo(&self) -> &dyn ScheduleRepository {
        self.repos.schedules.as_ref()
    }

    pub fn booking_repo(&self) -> &dyn BookingRepository {
        self.repos.bookings.as_ref()
    }

    pub fn payment_repo(&self) -> &dyn PaymentRepository {
        self.repos.payments.as_ref()
    }

    pub fn promo_repo(&self) -> &dyn PromoCodeRepository {
        self.repos.promo_codes.as_ref()
    }

    pub fn coin_repo(&self) -> &dyn CoinRepository {
        self.repos.coins.as_ref()
    }

    pub fn gift_repo(&self) -> &dyn GiftRepository {
        self.repos.gifts.as_ref()
    }

    pub fn withdrawal_repo(&self) -> &dyn WithdrawalRepository {
        self.repos.withdrawals.as_ref()
    }

    pub fn referral_repo(&self) -> &dyn ReferralRepository {
        self.repos.referrals.as_ref()
    }

    pub fn review_repo(&self) -> &dyn ReviewRepository {
        self.repos.reviews.as_ref()
    }

    pub fn chat_repo(&self) -> &dyn ChatRepository {
        self.repos.chat.as_ref()
    }

    pub fn notification_repo(&self) -> &dyn NotificationRepository {
        self.repos.notifications.as_ref()
    }

    pub fn announcement_repo(&self) -> &dyn AnnouncementRepository {
        self.repos.announcements.as_ref()
    }

    pub fn favorite_repo(&self) -> &dyn FavoriteRepository {
        self.repos.favorites.as_ref()
    }

    // === Cache Stores ===

    /// Get the refresh token store
    pub fn refresh_token_store(&self) -> &RefreshTokenStore {
        &self.refresh_token_store
    }

    pub fn unread_counts(&self) -> &UnreadCountCache {
        &self.unread_counts
    }

    pub fn cron_lock(&self) -> &CronLock {
        &self.cron_lock
    }

    // === Pub/Sub ===

    /// Get the Redis pub/sub publisher
    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    // === Services ===

    /// Get the JWT service
    pub fn jwt_service(&self) -> &JwtService {
        self.jwt_service.as_ref()
    }

    /// Generate a new Snowflake ID
    pub fn generate_id(&self) -> Snowflake {
        self.snowflake_generator.generate()
    }

    // === Settings ===

    pub fn platform(&self) -> &PlatformConfig {
        &self.platform
    }

    pub fn cron_config(&self) -> &CronConfig {
        &self.cron
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("pool", &"PgPool")
            .field("redis_pool", &"SharedRedisPool")
            .field("breaker", &self.resilience.breaker_state())
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

/// Builder for creating ServiceContext with custom configuration
#[derive(Default)]
pub struct ServiceContextBuilder {
    pool: Option<PgPool>,
    redis_pool: Option<SharedRedisPool>,
    resilience: Option<Arc<DbResilience>>,
    repos: Option<Repositories>,
    jwt_service: Option<Arc<JwtService>>,
    snowflake_generator: Option<Arc<SnowflakeGenerator>>,
    platform: PlatformConfig,
    cron: CronConfig,
    environment: Environment,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn redis_pool(mut self, redis_pool: SharedRedisPool) -> Self {
        self.redis_pool = Some(redis_pool);
        self
    }

    pub fn resilience(mut self, resilience: Arc<DbResilience>) -> Self {
        self.resilience = Some(resilience);
        self
    }

    /// Override the repositories; defaults to the Postgres implementations
    pub fn repositories(mut self, repos: Repositories) -> Self {
        self.repos = Some(repos);
        self
    }

    pub fn jwt_service(mut self, service: Arc<JwtService>) -> Self {
        self.jwt_service = Some(service);
        self
    }

    pub fn snowflake_generator(mut self, generator: Arc<SnowflakeGenerator>) -> Self {
        self.snowflake_generator = Some(generator);
        self
    }

    pub fn platform(mut self, platform: PlatformConfig) -> Self {
        self.platform = platform;
        self
    }

    pub fn cron(mut self, cron: CronConfig) -> Self {
        self.cron = cron;
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        let pool = self
            .pool
            .ok_or_else(|| ServiceError::validation("pool is required"))?;
        let redis_pool = self
            .redis_pool
            .ok_or_else(|| ServiceError::validation("redis_pool is required"))?;
        let resilience = self
            .resilience
            .ok_or_else(|| ServiceError::validation("resilience is required"))?;
        let jwt_service = self
            .jwt_service
            .ok_or_else(|| ServiceError::validation("jwt_service is required"))?;
        let snowflake_generator = self
            .snowflake_generator
            .ok_or_else(|| ServiceError::validation("snowflake_generator is required"))?;
        let repos = self
            .repos
            .unwrap_or_else(|| Repositories::postgres(&pool, &resilience));

        Ok(ServiceContext::new(
            pool,
            redis_pool,
            resilience,
            repos,
            jwt_service,
            snowflake_generator,
            self.platform,
            self.cron,
            self.environment,
        ))
    }
}

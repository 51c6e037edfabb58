//! # peiplay-cache
//!
//! Redis layer: refresh-token sessions, the unread-count cache, cron locks,
//! and pub/sub publishing.
//!
//! ## Example
//!
//! ```ignore
//! use peiplay_cache::{PubSubChannel, Publisher, RedisPool, RedisPoolConfig};
//!
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//! let publisher = Publisher::new(pool.clone());
//! publisher.publish_domain_event(&[PubSubChannel::user(user_id)], &event).await?;
//! ```

pub mod counters;
pub mod lock;
pub mod pool;
pub mod pubsub;
pub mod session;

pub use counters::{UnreadCountCache, UNREAD_COUNT_TTL};
pub use lock::{CronLock, LockToken};
pub use pool::{
    create_shared_pool, RedisPool, RedisPoolConfig, RedisPoolError, RedisResult, SharedRedisPool,
};
pub use pubsub::{
    PubSubChannel, PubSubEvent, Publisher, ADMIN_CHANNEL, BROADCAST_CHANNEL, ROOM_CHANNEL_PREFIX,
    USER_CHANNEL_PREFIX,
};
pub use session::{RefreshTokenData, RefreshTokenStore};

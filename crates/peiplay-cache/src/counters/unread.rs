//! Short-lived cache of per-user unread chat counts

use peiplay_core::Snowflake;

use crate::pool::{RedisPool, RedisResult};

const UNREAD_PREFIX: &str = "chat:unread-count:";

/// Seconds a cached count stays valid
pub const UNREAD_COUNT_TTL: u64 = 5;

#[derive(Clone)]
pub struct UnreadCountCache {
    pool: RedisPool,
}

impl UnreadCountCache {
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    fn key(user_id: Snowflake) -> String {
        format!("{UNREAD_PREFIX}{user_id}")
    }

    pub async fn get(&self, user_id: Snowflake) -> RedisResult<Option<i64>> {
        self.pool.get_value(&Self::key(user_id)).await
    }

    pub async fn set(&self, user_id: Snowflake, count: i64) -> RedisResult<()> {
        self.pool
            .set(&Self::key(user_id), &count, Some(UNREAD_COUNT_TTL))
            .await
    }

    pub async fn invalidate(&self, user_id: Snowflake) -> RedisResult<()> {
        self.pool.delete(&Self::key(user_id)).await.map(|_| ())
    }

    /// Drop the cached count of every member of a room
    pub async fn invalidate_many(&self, user_ids: &[Snowflake]) -> RedisResult<()> {
        let keys: Vec<String> = user_ids.iter().map(|id| Self::key(*id)).collect();
        self.pool.delete_many(&keys).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key() {
        assert_eq!(
            UnreadCountCache::key(Snowflake::new(3)),
            "chat:unread-count:3"
        );
    }
}

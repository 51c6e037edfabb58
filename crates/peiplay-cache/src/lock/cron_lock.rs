//! Cross-instance lock for scheduled sweeps (`SET NX EX`)
//!
//! Each acquisition stores a random token; release deletes the key only while
//! it still holds that token, so an instance whose lock already expired cannot
//! free a lock taken over by another instance.

use redis::Script;
use uuid::Uuid;

use crate::pool::{RedisPool, RedisResult};

const LOCK_PREFIX: &str = "cron-lock:";

const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
end
return 0
"#;

#[derive(Clone)]
pub struct CronLock {
    pool: RedisPool,
}

/// Proof of a held lock; pass it back to [`CronLock::release`]
#[derive(Debug)]
#[must_use]
pub struct LockToken {
    key: String,
    token: String,
}

impl LockToken {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl CronLock {
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    fn key(job: &str) -> String {
        format!("{LOCK_PREFIX}{job}")
    }

    /// `None` while another instance holds the lock
    pub async fn try_acquire(&self, job: &str, ttl_seconds: u64) -> RedisResult<Option<LockToken>> {
        let key = Self::key(job);
        let token = Uuid::new_v4().to_string();
        let acquired = self.pool.set_nx_ex(&key, &token, ttl_seconds).await?;
        Ok(acquired.then_some(LockToken { key, token }))
    }

    /// Returns false if the lock had already expired or changed hands
    pub async fn release(&self, lock: LockToken) -> RedisResult<bool> {
        let mut conn = self.pool.get().await?;
        let deleted: i32 = Script::new(RELEASE_SCRIPT)
            .key(&lock.key)
            .arg(&lock.token)
            .invoke_async(&mut conn)
            .await?;
        Ok(deleted == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key() {
        assert_eq!(CronLock::key("complete_bookings"), "cron-lock:complete_bookings");
    }
}

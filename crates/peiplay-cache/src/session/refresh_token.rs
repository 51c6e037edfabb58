//! Refresh token sessions in Redis.
//!
//! Sessions are keyed by the refresh token's `jti` claim, so a signed token that
//! was revoked or rotated is rejected even though its signature still verifies.

use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

use peiplay_core::Snowflake;

use crate::pool::{RedisPool, RedisResult};

const REFRESH_TOKEN_PREFIX: &str = "refresh_token:";
const USER_TOKENS_PREFIX: &str = "user_tokens:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenData {
    pub user_id: Snowflake,
    /// Unix epoch seconds
    pub created_at: i64,
    pub user_agent: Option<String>,
}

impl RefreshTokenData {
    #[must_use]
    pub fn new(user_id: Snowflake) -> Self {
        Self {
            user_id,
            created_at: chrono::Utc::now().timestamp(),
            user_agent: None,
        }
    }

    #[must_use]
    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }
}

#[derive(Clone)]
pub struct RefreshTokenStore {
    pool: RedisPool,
}

impl RefreshTokenStore {
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    fn key(jti: &str) -> String {
        format!("{REFRESH_TOKEN_PREFIX}{jti}")
    }

    fn user_key(user_id: Snowflake) -> String {
        format!("{USER_TOKENS_PREFIX}{user_id}")
    }

    /// Record a session that lives as long as the token itself
    pub async fn store(
        &self,
        jti: &str,
        data: &RefreshTokenData,
        ttl_seconds: u64,
    ) -> RedisResult<()> {
        self.pool.set(&Self::key(jti), data, Some(ttl_seconds)).await?;

        let user_key = Self::user_key(data.user_id);
        let mut conn = self.pool.get().await?;
        conn.sadd::<_, _, ()>(&user_key, jti).await?;
        conn.expire::<_, ()>(&user_key, i64::try_from(ttl_seconds).unwrap_or(i64::MAX))
            .await?;

        tracing::debug!(user_id = %data.user_id, "Stored refresh session");
        Ok(())
    }

    /// Session data if the token is still live
    pub async fn validate(&self, jti: &str) -> RedisResult<Option<RefreshTokenData>> {
        self.pool.get_value(&Self::key(jti)).await
    }

    /// Returns false when the session had already gone
    pub async fn revoke(&self, jti: &str) -> RedisResult<bool> {
        if let Some(data) = self.validate(jti).await? {
            let mut conn = self.pool.get().await?;
            conn.srem::<_, _, ()>(Self::user_key(data.user_id), jti)
                .await?;
        }
        self.pool.delete(&Self::key(jti)).await
    }

    /// Log out everywhere; returns the number of sessions dropped
    pub async fn revoke_all_for_user(&self, user_id: Snowflake) -> RedisResult<usize> {
        let user_key = Self::user_key(user_id);
        let mut conn = self.pool.get().await?;

        let jtis: Vec<String> = conn.smembers(&user_key).await?;
        let keys: Vec<String> = jtis.iter().map(|jti| Self::key(jti)).collect();
        self.pool.delete_many(&keys).await?;
        conn.del::<_, ()>(&user_key).await?;

        tracing::info!(user_id = %user_id, count = jtis.len(), "Revoked all refresh sessions");
        Ok(jtis.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys() {
        assert_eq!(RefreshTokenStore::key("abc"), "refresh_token:abc");
        assert_eq!(
            RefreshTokenStore::user_key(Snowflake::new(12)),
            "user_tokens:12"
        );
    }

    #[test]
    fn test_session_data_round_trip() {
        let data = RefreshTokenData::new(Snowflake::new(5)).with_user_agent("curl/8.0");
        let json = serde_json::to_string(&data).unwrap();
        let parsed: RefreshTokenData = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, data);
    }
}

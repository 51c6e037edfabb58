//! JWT issuing and validation
//!
//! Every token carries a random `jti`. Refresh-token `jti`s are what the
//! session store in Redis tracks, so revocation works per token.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use peiplay_core::Snowflake;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub token_type: TokenType,
    /// Unique token id
    pub jti: String,
}

impl Claims {
    /// # Errors
    /// Returns `InvalidToken` if the subject is not a snowflake
    pub fn user_id(&self) -> Result<Snowflake, AppError> {
        self.sub.parse().map_err(|_| AppError::InvalidToken)
    }

    #[must_use]
    pub fn is_access_token(&self) -> bool {
        self.token_type == TokenType::Access
    }

    #[must_use]
    pub fn is_refresh_token(&self) -> bool {
        self.token_type == TokenType::Refresh
    }
}

/// Token pair returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// A freshly minted pair plus the refresh token id to register
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub pair: TokenPair,
    pub refresh_jti: String,
    pub refresh_ttl_secs: u64,
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

impl JwtService {
    #[must_use]
    pub fn new(secret: &str, access_token_expiry: i64, refresh_token_expiry: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expiry,
            refresh_token_expiry,
        }
    }

    /// # Errors
    /// Returns an error if token encoding fails
    pub fn issue(&self, user_id: Snowflake) -> Result<IssuedTokens, AppError> {
        let (access_token, _) = self.encode_token(user_id, TokenType::Access)?;
        let (refresh_token, refresh_jti) = self.encode_token(user_id, TokenType::Refresh)?;

        Ok(IssuedTokens {
            pair: TokenPair {
                access_token,
                refresh_token,
                token_type: "Bearer".to_string(),
                expires_in: self.access_token_expiry,
            },
            refresh_jti,
            refresh_ttl_secs: u64::try_from(self.refresh_token_expiry).unwrap_or(0),
        })
    }

    fn encode_token(
        &self,
        user_id: Snowflake,
        token_type: TokenType,
    ) -> Result<(String, String), AppError> {
        let now = Utc::now();
        let expiry = match token_type {
            TokenType::Access => self.access_token_expiry,
            TokenType::Refresh => self.refresh_token_expiry,
        };
        let jti = Uuid::new_v4().simple().to_string();

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(expiry)).timestamp(),
            token_type,
            jti: jti.clone(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode JWT: {e}")))?;
        Ok((token, jti))
    }

    /// # Errors
    /// Returns `TokenExpired` or `InvalidToken`
    pub fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => AppError::InvalidToken,
            })
    }

    /// # Errors
    /// Returns an error if the token is invalid, expired, or not an access token
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.decode_token(token)?;
        if !claims.is_access_token() {
            return Err(AppError::InvalidToken);
        }
        Ok(claims)
    }

    /// # Errors
    /// Returns an error if the token is invalid, expired, or not a refresh token
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.decode_token(token)?;
        if !claims.is_refresh_token() {
            return Err(AppError::InvalidToken);
        }
        Ok(claims)
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new("test-secret-key-that-is-long-enough", 900, 604_800)
    }

    #[test]
    fn test_issue_pair() {
        let issued = service().issue(Snowflake::new(12345)).unwrap();
        assert_eq!(issued.pair.token_type, "Bearer");
        assert_eq!(issued.pair.expires_in, 900);
        assert_eq!(issued.refresh_ttl_secs, 604_800);
        assert!(!issued.refresh_jti.is_empty());
    }

    #[test]
    fn test_token_kinds_are_not_interchangeable() {
        let jwt = service();
        let issued = jwt.issue(Snowflake::new(7)).unwrap();

        let access = jwt.validate_access_token(&issued.pair.access_token).unwrap();
        assert_eq!(access.user_id().unwrap(), Snowflake::new(7));
        assert!(jwt.validate_access_token(&issued.pair.refresh_token).is_err());

        let refresh = jwt.validate_refresh_token(&issued.pair.refresh_token).unwrap();
        assert_eq!(refresh.jti, issued.refresh_jti);
        assert!(jwt.validate_refresh_token(&issued.pair.access_token).is_err());
    }

    #[test]
    fn test_each_issue_gets_new_jti() {
        let jwt = service();
        let a = jwt.issue(Snowflake::new(1)).unwrap();
        let b = jwt.issue(Snowflake::new(1)).unwrap();
        assert_ne!(a.refresh_jti, b.refresh_jti);
    }

    #[test]
    fn test_invalid_token() {
        assert!(matches!(
            service().decode_token("invalid.token.here"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issued = service().issue(Snowflake::new(1)).unwrap();
        let other = JwtService::new("a-completely-different-secret", 900, 900);
        assert!(other.decode_token(&issued.pair.access_token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let jwt = JwtService::new("test-secret-key-that-is-long-enough", -120, -120);
        let issued = jwt.issue(Snowflake::new(1)).unwrap();
        assert!(matches!(
            jwt.decode_token(&issued.pair.access_token),
            Err(AppError::TokenExpired)
        ));
    }
}

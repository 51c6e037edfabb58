//! Service layer error type
//!
//! Domain rule violations and application errors pass through with their own
//! status and code; the remaining variants cover wiring and invariant failures.

use peiplay_cache::RedisPoolError;
use peiplay_common::{domain_status, AppError};
use peiplay_core::DomainError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    App(#[from] AppError),

    /// Input the request DTOs could not rule out on their own
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP status the API layer answers with
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Domain(e) => domain_status(e),
            Self::App(e) => e.status_code(),
            Self::Validation(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    pub fn error_code(&self) -> &str {
        match self {
            Self::Domain(e) => e.code(),
            Self::App(e) => e.error_code(),
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

// Redis failures surface as cache errors; callers that can live without the
// cache log and carry on instead of using `?`
impl From<RedisPoolError> for ServiceError {
    fn from(err: RedisPoolError) -> Self {
        Self::App(AppError::Cache(err.to_string()))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use peiplay_core::Snowflake;

    #[test]
    fn test_domain_errors_keep_their_code() {
        let err = ServiceError::from(DomainError::BookingConflict {
            schedule_id: Snowflake::new(9),
        });
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "BOOKING_CONFLICT");

        let err = ServiceError::from(DomainError::AccountSuspended { until: None });
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn test_open_breaker_is_unavailable() {
        let err = ServiceError::from(DomainError::ServiceUnavailable("database".to_string()));
        assert_eq!(err.status_code(), 503);
    }

    #[test]
    fn test_wiring_errors() {
        assert_eq!(ServiceError::validation("pool is required").status_code(), 400);
        let err = ServiceError::internal("ledger out of balance");
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_cache_failure_maps_to_cache_error() {
        let err = ServiceError::App(AppError::Cache("connection refused".to_string()));
        assert_eq!(err.error_code(), "CACHE_ERROR");
        assert_eq!(err.status_code(), 500);
    }
}

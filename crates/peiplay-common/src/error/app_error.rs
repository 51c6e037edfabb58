//! Application error types
//!
//! Errors raised below the service layer: authentication, infrastructure and
//! configuration failures, plus domain rule violations carried through as-is.

use peiplay_core::DomainError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Authentication
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    // Infrastructure
    #[error("Database error: {0}")]
    Database(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidBody(_) => 400,
            Self::InvalidCredentials | Self::InvalidToken | Self::TokenExpired | Self::MissingAuth => 401,
            Self::Database(_) | Self::Cache(_) | Self::Internal(_) | Self::Config(_) => 500,
            Self::Domain(e) => domain_status(e),
        }
    }

    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::MissingAuth => "MISSING_AUTH",
            Self::InvalidBody(_) => "INVALID_BODY",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Cache(_) => "CACHE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Domain(e) => e.code(),
        }
    }

    /// Structured context for the error payload
    #[must_use]
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Domain(e) => e.details(),
            _ => None,
        }
    }
}

/// HTTP status for a domain rule failure
#[must_use]
pub fn domain_status(e: &DomainError) -> u16 {
    if e.is_not_found() {
        404
    } else if matches!(e, DomainError::AccountSuspended { .. }) || e.is_authorization() {
        403
    } else if e.is_validation() {
        400
    } else if e.is_conflict() {
        409
    } else if e.is_unavailable() {
        503
    } else {
        500
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peiplay_core::Snowflake;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::InvalidCredentials.status_code(), 401);
        assert_eq!(AppError::TokenExpired.status_code(), 401);
        assert_eq!(AppError::InvalidBody("empty".to_string()).status_code(), 400);
        assert_eq!(AppError::Database("test".to_string()).status_code(), 500);
        assert_eq!(AppError::Config("bad port".to_string()).status_code(), 500);
    }

    #[test]
    fn test_domain_status_codes() {
        let cases = [
            (DomainError::BookingNotFound(Snowflake::new(1)), 404),
            (DomainError::ReasonRequired, 400),
            (DomainError::AdminRequired, 403),
            (DomainError::AccountSuspended { until: None }, 403),
            (DomainError::PendingWithdrawalExists, 409),
            (DomainError::ServiceUnavailable("breaker open".into()), 503),
            (DomainError::DatabaseError("boom".into()), 500),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::Domain(err).status_code(), status);
        }
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::InvalidCredentials.error_code(), "INVALID_CREDENTIALS");
        assert_eq!(AppError::InvalidBody(String::new()).error_code(), "INVALID_BODY");
        assert_eq!(
            AppError::Domain(DomainError::TimeConflict {
                schedule_id: Snowflake::new(3)
            })
            .error_code(),
            "TIME_CONFLICT"
        );
    }

    #[test]
    fn test_domain_details_pass_through() {
        let err = AppError::Domain(DomainError::BookingConflict {
            schedule_id: Snowflake::new(42),
        });
        let details = err.details().unwrap();
        assert_eq!(details["conflicting_schedule_id"], "42");
        assert!(AppError::MissingAuth.details().is_none());
    }
}

//! Error handling utilities for repositories

use peiplay_core::DomainError;
use sqlx::Error as SqlxError;

/// SQLSTATE classes and codes worth retrying: connection exceptions,
/// admin/crash shutdowns, serialization failures, and deadlocks
fn is_transient_sqlstate(code: &str) -> bool {
    code.starts_with("08") || matches!(code, "57P01" | "57P02" | "57P03" | "40001" | "40P01")
}

fn is_transient_message(message: &str) -> bool {
    let message = message.to_lowercase();
    ["connection refused", "connection reset", "timed out", "timeout"]
        .iter()
        .any(|needle| message.contains(needle))
}

/// Whether a failed statement may succeed if simply tried again
pub fn is_transient(e: &SqlxError) -> bool {
    match e {
        SqlxError::Io(_)
        | SqlxError::Tls(_)
        | SqlxError::PoolTimedOut
        | SqlxError::PoolClosed
        | SqlxError::WorkerCrashed => true,
        SqlxError::Database(db) => {
            db.code().is_some_and(|code| is_transient_sqlstate(&code))
                || is_transient_message(db.message())
        }
        _ => false,
    }
}

/// Convert SQLx error to DomainError
pub fn map_db_error(e: SqlxError) -> DomainError {
    if is_transient(&e) {
        DomainError::DatabaseUnavailable(e.to_string())
    } else {
        DomainError::DatabaseError(e.to_string())
    }
}

/// Check for unique violation and return appropriate error or fallback
pub fn map_unique_violation<F>(e: SqlxError, on_unique: F) -> DomainError
where
    F: FnOnce() -> DomainError,
{
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return on_unique();
        }
    }
    map_db_error(e)
}

/// Unique or exclusion constraint violation (23505 / 23P01)
pub fn is_overlap_violation(e: &SqlxError) -> bool {
    e.as_database_error().is_some_and(|db| {
        db.is_unique_violation() || db.code().as_deref() == Some("23P01")
    })
}

pub fn map_overlap_violation<F>(e: SqlxError, on_overlap: F) -> DomainError
where
    F: FnOnce() -> DomainError,
{
    if is_overlap_violation(&e) {
        return on_overlap();
    }
    map_db_error(e)
}

/// A CHECK constraint rejected the row (23514)
pub fn is_check_violation(e: &SqlxError) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_check_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_sqlstates() {
        assert!(is_transient_sqlstate("08006"));
        assert!(is_transient_sqlstate("57P01"));
        assert!(is_transient_sqlstate("40P01"));
        assert!(!is_transient_sqlstate("23505"));
        assert!(!is_transient_sqlstate("42P01"));
    }

    #[test]
    fn test_transient_messages() {
        assert!(is_transient_message("Connection refused (os error 111)"));
        assert!(is_transient_message("statement timed out"));
        assert!(!is_transient_message("duplicate key value violates unique constraint"));
    }

    #[test]
    fn test_pool_errors_are_unavailable() {
        assert!(matches!(
            map_db_error(SqlxError::PoolTimedOut),
            DomainError::DatabaseUnavailable(_)
        ));
        assert!(matches!(
            map_db_error(SqlxError::RowNotFound),
            DomainError::DatabaseError(_)
        ));
    }
}

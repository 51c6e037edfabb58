//! Password hashing and strength rules (Argon2id)

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use peiplay_core::DomainError;

use crate::error::AppError;

pub const MIN_PASSWORD_LENGTH: usize = 8;
/// Longer inputs are rejected rather than silently truncated
pub const MAX_PASSWORD_LENGTH: usize = 72;

/// Hash a password using Argon2id
///
/// # Errors
/// Returns an error if hashing fails
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {e}")))
}

/// Verify a password against a stored hash
///
/// # Errors
/// Returns an error if the stored hash is malformed
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid password hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Length 8-72 with at least one uppercase letter, one lowercase letter and one digit
///
/// # Errors
/// Returns `DomainError::WeakPassword` naming the first unmet rule
pub fn validate_password_strength(password: &str) -> Result<(), DomainError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(DomainError::WeakPassword(format!(
            "must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(DomainError::WeakPassword(format!(
            "must be at most {MAX_PASSWORD_LENGTH} characters long"
        )));
    }
    if !password.chars().any(char::is_uppercase) {
        return Err(DomainError::WeakPassword(
            "must contain at least one uppercase letter".to_string(),
        ));
    }
    if !password.chars().any(char::is_lowercase) {
        return Err(DomainError::WeakPassword(
            "must contain at least one lowercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(DomainError::WeakPassword(
            "must contain at least one digit".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("Booking2025").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Booking2025", &hash).unwrap());
        assert!(!verify_password("booking2025", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("Booking2025").unwrap();
        let b = hash_password("Booking2025").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash() {
        assert!(verify_password("anything", "not-a-hash").is_err());
    }

    #[test]
    fn test_strength_rules() {
        assert!(validate_password_strength("Abcdefg1").is_ok());
        assert!(matches!(
            validate_password_strength("Abc1"),
            Err(DomainError::WeakPassword(_))
        ));
        assert!(validate_password_strength("abcdefg1").is_err());
        assert!(validate_password_strength("ABCDEFG1").is_err());
        assert!(validate_password_strength("Abcdefgh").is_err());
        let long = format!("Aa1{}", "x".repeat(MAX_PASSWORD_LENGTH));
        assert!(validate_password_strength(&long).is_err());
    }
}

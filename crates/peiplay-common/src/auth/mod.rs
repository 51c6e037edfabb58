//! Authentication utilities

mod jwt;
mod password;

pub use jwt::{Claims, IssuedTokens, JwtService, TokenPair, TokenType};
pub use password::{
    hash_password, validate_password_strength, verify_password, MAX_PASSWORD_LENGTH,
    MIN_PASSWORD_LENGTH,
};

//! # peiplay-common
//!
//! Shared utilities: configuration, error handling, authentication, and telemetry.

pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::{
    hash_password, validate_password_strength, verify_password, Claims, IssuedTokens, JwtService,
    TokenPair, TokenType,
};
pub use config::{
    AppConfig, AppSettings, ConfigError, CorsConfig, CronConfig, DatabaseConfig, Environment,
    JwtConfig, PlatformConfig, RateLimitConfig, RedisConfig, ResilienceConfig, ServerConfig,
    SnowflakeConfig,
};
pub use error::{domain_status, AppError};
pub use telemetry::{try_init_tracing, try_init_tracing_with_config, TracingConfig, TracingError};

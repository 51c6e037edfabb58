//! Application configuration structs
//!
//! Everything is read from environment variables (a `.env` file is honoured
//! in development). Only connection strings, the JWT secret, and the API port
//! are mandatory.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
    pub snowflake: SnowflakeConfig,
    pub platform: PlatformConfig,
    pub cron: CronConfig,
    pub resilience: ResilienceConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" | "dev" => Some(Self::Development),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Apply pending SQL migrations at startup
    #[serde(default)]
    pub run_migrations: bool,
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default = "default_redis_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    /// Seconds
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: i64,
    /// Seconds
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    #[serde(default = "default_burst")]
    pub burst: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnowflakeConfig {
    #[serde(default)]
    pub worker_id: u16,
}

/// Marketplace business constants
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    /// Share of booking revenue kept by the platform
    pub platform_fee_rate: Decimal,
    /// "Available now" switches itself off after this many minutes
    pub availability_window_minutes: i64,
    /// Instant bookings start this many minutes from now
    pub instant_lead_minutes: i64,
    /// Messages each sender may post in a room with no booking
    pub free_chat_message_limit: i64,
    /// How far back the referral sweep looks for completed bookings
    pub referral_lookback_days: i64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            platform_fee_rate: Decimal::new(15, 2),
            availability_window_minutes: 30,
            instant_lead_minutes: 15,
            free_chat_message_limit: 5,
            referral_lookback_days: 7,
        }
    }
}

/// Scheduled maintenance endpoints and the optional in-process scheduler
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CronConfig {
    /// Bearer secret for `/cron/*`; unset means development-only access
    pub secret: Option<String>,
    #[serde(default)]
    pub scheduler_enabled: bool,
    #[serde(default = "default_scheduler_interval")]
    pub scheduler_interval_secs: u64,
}

/// Retry and circuit-breaker tuning for database access
#[derive(Debug, Clone, Deserialize)]
pub struct ResilienceConfig {
    pub retry_max_attempts: u32,
    pub retry_initial_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub retry_multiplier: u32,
    pub breaker_failure_threshold: u32,
    pub breaker_success_threshold: u32,
    pub breaker_reset_timeout_secs: u64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            retry_max_attempts: 3,
            retry_initial_delay_ms: 1_000,
            retry_max_delay_ms: 10_000,
            retry_multiplier: 2,
            breaker_failure_threshold: 5,
            breaker_success_threshold: 2,
            breaker_reset_timeout_secs: 90,
        }
    }
}

impl ResilienceConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.retry_initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }

    pub fn reset_timeout(&self) -> Duration {
        Duration::from_secs(self.breaker_reset_timeout_secs)
    }
}

// Default value functions
fn default_app_name() -> String {
    "peiplay".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_migrations_dir() -> String {
    "migrations".to_string()
}

fn default_min_connections() -> u32 {
    2
}

fn default_redis_max_connections() -> u32 {
    10
}

fn default_access_token_expiry() -> i64 {
    900 // 15 minutes
}

fn default_refresh_token_expiry() -> i64 {
    604_800 // 7 days
}

fn default_requests_per_second() -> u32 {
    10
}

fn default_burst() -> u32 {
    50
}

fn default_scheduler_interval() -> u64 {
    300
}

/// Parsed value of `name`, or `default` when unset or unparsable
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .ok_or(ConfigError::MissingVar(name))
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .map(|s| matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a required variable is missing or a value is out of range
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let port = env_required("API_PORT")?;
        let port = port
            .parse()
            .map_err(|_| ConfigError::InvalidValue("API_PORT", port))?;

        let worker_id: u16 = env_or("WORKER_ID", 0);
        if worker_id >= 1024 {
            return Err(ConfigError::InvalidValue(
                "WORKER_ID",
                worker_id.to_string(),
            ));
        }

        let platform_defaults = PlatformConfig::default();
        let platform_fee_rate = env_or("PLATFORM_FEE_RATE", platform_defaults.platform_fee_rate);
        if platform_fee_rate < Decimal::ZERO || platform_fee_rate >= Decimal::ONE {
            return Err(ConfigError::InvalidValue(
                "PLATFORM_FEE_RATE",
                platform_fee_rate.to_string(),
            ));
        }

        let resilience_defaults = ResilienceConfig::default();

        Ok(Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: env::var("APP_ENV")
                    .ok()
                    .and_then(|s| Environment::parse(&s))
                    .unwrap_or_default(),
            },
            api: ServerConfig {
                host: env::var("API_HOST").unwrap_or_else(|_| default_host()),
                port,
            },
            database: DatabaseConfig {
                url: env_required("DATABASE_URL")?,
                max_connections: env_or("DATABASE_MAX_CONNECTIONS", default_max_connections()),
                min_connections: env_or("DATABASE_MIN_CONNECTIONS", default_min_connections()),
                run_migrations: env_bool("RUN_MIGRATIONS", false),
                migrations_dir: env_or("MIGRATIONS_DIR", default_migrations_dir()),
            },
            redis: RedisConfig {
                url: env_required("REDIS_URL")?,
                max_connections: env_or("REDIS_MAX_CONNECTIONS", default_redis_max_connections()),
            },
            jwt: JwtConfig {
                secret: env_required("JWT_SECRET")?,
                access_token_expiry: env_or(
                    "JWT_ACCESS_TOKEN_EXPIRY",
                    default_access_token_expiry(),
                ),
                refresh_token_expiry: env_or(
                    "JWT_REFRESH_TOKEN_EXPIRY",
                    default_refresh_token_expiry(),
                ),
            },
            rate_limit: RateLimitConfig {
                requests_per_second: env_or(
                    "RATE_LIMIT_REQUESTS_PER_SECOND",
                    default_requests_per_second(),
                ),
                burst: env_or("RATE_LIMIT_BURST", default_burst()),
            },
            cors: CorsConfig {
                allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                    .ok()
                    .map(|s| {
                        s.split(',')
                            .map(str::trim)
                            .filter(|o| !o.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            snowflake: SnowflakeConfig { worker_id },
            platform: PlatformConfig {
                platform_fee_rate,
                availability_window_minutes: env_or(
                    "AVAILABILITY_WINDOW_MINUTES",
                    platform_defaults.availability_window_minutes,
                ),
                instant_lead_minutes: env_or(
                    "INSTANT_BOOKING_LEAD_MINUTES",
                    platform_defaults.instant_lead_minutes,
                ),
                free_chat_message_limit: env_or(
                    "FREE_CHAT_MESSAGE_LIMIT",
                    platform_defaults.free_chat_message_limit,
                ),
                referral_lookback_days: env_or(
                    "REFERRAL_LOOKBACK_DAYS",
                    platform_defaults.referral_lookback_days,
                ),
            },
            cron: CronConfig {
                secret: env::var("CRON_SECRET")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
                scheduler_enabled: env_bool("SCHEDULER_ENABLED", false),
                scheduler_interval_secs: env_or(
                    "SCHEDULER_INTERVAL_SECS",
                    default_scheduler_interval(),
                ),
            },
            resilience: ResilienceConfig {
                retry_max_attempts: env_or(
                    "DB_RETRY_MAX_ATTEMPTS",
                    resilience_defaults.retry_max_attempts,
                )
                .max(1),
                retry_initial_delay_ms: env_or(
                    "DB_RETRY_INITIAL_DELAY_MS",
                    resilience_defaults.retry_initial_delay_ms,
                ),
                retry_max_delay_ms: env_or(
                    "DB_RETRY_MAX_DELAY_MS",
                    resilience_defaults.retry_max_delay_ms,
                ),
                retry_multiplier: resilience_defaults.retry_multiplier,
                breaker_failure_threshold: env_or(
                    "DB_BREAKER_FAILURE_THRESHOLD",
                    resilience_defaults.breaker_failure_threshold,
                ),
                breaker_success_threshold: resilience_defaults.breaker_success_threshold,
                breaker_reset_timeout_secs: env_or(
                    "DB_BREAKER_RESET_TIMEOUT_SECS",
                    resilience_defaults.breaker_reset_timeout_secs,
                ),
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("PRODUCTION"), Some(Environment::Production));
        assert_eq!(Environment::parse("dev"), Some(Environment::Development));
        assert_eq!(Environment::parse("qa"), None);
        assert!(Environment::Production.is_production());
        assert!(!Environment::Staging.is_development());
    }

    #[test]
    fn test_server_address() {
        let config = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
        };
        assert_eq!(config.address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_platform_defaults() {
        let platform = PlatformConfig::default();
        assert_eq!(platform.platform_fee_rate, Decimal::new(15, 2));
        assert_eq!(platform.availability_window_minutes, 30);
        assert_eq!(platform.instant_lead_minutes, 15);
        assert_eq!(platform.free_chat_message_limit, 5);
    }

    #[test]
    fn test_resilience_defaults() {
        let r = ResilienceConfig::default();
        assert_eq!(r.retry_max_attempts, 3);
        assert_eq!(r.initial_delay(), Duration::from_secs(1));
        assert_eq!(r.max_delay(), Duration::from_secs(10));
        assert_eq!(r.breaker_failure_threshold, 5);
        assert_eq!(r.breaker_success_threshold, 2);
        assert_eq!(r.reset_timeout(), Duration::from_secs(90));
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        // Variable names are unique to this test to avoid cross-test interference
        env::set_var("PEIPLAY_TEST_ENV_OR", "not-a-number");
        assert_eq!(env_or("PEIPLAY_TEST_ENV_OR", 7u32), 7);
        env::set_var("PEIPLAY_TEST_ENV_OR", " 12 ");
        assert_eq!(env_or("PEIPLAY_TEST_ENV_OR", 7u32), 12);
        env::remove_var("PEIPLAY_TEST_ENV_OR");
    }

    #[test]
    fn test_env_bool() {
        env::set_var("PEIPLAY_TEST_ENV_BOOL", "TRUE");
        assert!(env_bool("PEIPLAY_TEST_ENV_BOOL", false));
        env::set_var("PEIPLAY_TEST_ENV_BOOL", "0");
        assert!(!env_bool("PEIPLAY_TEST_ENV_BOOL", true));
        env::remove_var("PEIPLAY_TEST_ENV_BOOL");
        assert!(env_bool("PEIPLAY_TEST_ENV_BOOL", true));
    }
}

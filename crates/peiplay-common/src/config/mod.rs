//! Configuration structs

mod app_config;

pub use app_config::{
    AppConfig, AppSettings, ConfigError, CorsConfig, CronConfig, DatabaseConfig, Environment,
    JwtConfig, PlatformConfig, RateLimitConfig, RedisConfig, ResilienceConfig, ServerConfig,
    SnowflakeConfig,
};

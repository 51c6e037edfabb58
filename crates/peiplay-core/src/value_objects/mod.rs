//! Value objects - immutable types that represent domain concepts

mod money;
mod snowflake;
mod time_range;

pub use money::{round_money, round_rating};
pub use snowflake::{Snowflake, SnowflakeGenerator, SnowflakeParseError};
pub use time_range::TimeRange;

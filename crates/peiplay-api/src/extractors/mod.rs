//! Axum extractors for request handling
//!
//! Custom extractors for authentication, validation, pagination, and the cron
//! guard. All of them reject with [`ApiError`](crate::response::ApiError).

mod auth;
mod cron;
mod ids;
mod pagination;
mod validated;

pub use auth::{AuthUser, OptionalAuthUser};
pub use cron::CronAuth;
pub use ids::IdPath;
pub use pagination::{Pagination, QueryParams};
pub use validated::{OptionalValidatedJson, ValidatedJson};

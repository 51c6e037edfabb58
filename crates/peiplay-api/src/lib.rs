//! # peiplay-api
//!
//! REST API server built on Axum. Every marketplace endpoint is mounted under
//! `/api/v1`; liveness and readiness probes live at the root.

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;

pub use server::{create_app, create_app_state, run};
pub use state::AppState;

//! # peiplay-service
//!
//! Application layer: marketplace use cases, request/response DTOs, and the
//! scheduled sweeps.

pub mod dto;
pub mod services;

pub use services::{ServiceContext, ServiceContextBuilder, ServiceError, ServiceResult};

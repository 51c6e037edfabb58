//! Route handlers
//!
//! Thin adapters from HTTP to the service layer, one module per area.

pub mod admin;
pub mod announcements;
pub mod auth;
pub mod bookings;
pub mod chat;
pub mod coins;
pub mod cron;
pub mod favorites;
pub mod gifts;
pub mod health;
pub mod notifications;
pub mod partners;
pub mod payments;
pub mod promo;
pub mod referrals;
pub mod reviews;
pub mod schedules;
pub mod withdrawals;

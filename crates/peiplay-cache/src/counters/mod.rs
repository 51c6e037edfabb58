//! Cached counters

mod unread;

pub use unread::{UnreadCountCache, UNREAD_COUNT_TTL};

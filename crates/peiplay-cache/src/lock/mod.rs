//! Distributed locks

mod cron_lock;

pub use cron_lock::{CronLock, LockToken};

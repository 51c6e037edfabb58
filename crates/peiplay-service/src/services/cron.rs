//! Scheduled sweeps
//!
//! Each sweep is reachable over HTTP (guarded by the cron secret) and from the
//! optional in-process scheduler. The scheduler takes a Redis lock per sweep so
//! only one instance runs it at a time.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use peiplay_cache::PubSubChannel;
use peiplay_common::{AppError, CronConfig, Environment};
use peiplay_core::events::{DomainEvent, PartnerAvailabilityChangedEvent};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use crate::dto::{map_all, AutoCloseResponse, CompleteBookingsResponse, ReferralSweepResponse};

use super::booking::BookingService;
use super::context::ServiceContext;
use super::error::ServiceResult;
use super::referral::ReferralService;

pub const AUTO_CLOSE_JOB: &str = "auto_close_available";
pub const COMPLETE_BOOKINGS_JOB: &str = "complete_bookings";
pub const REFERRAL_EARNINGS_JOB: &str = "calculate_referral_earnings";

fn secrets_match(expected: &str, presented: &str) -> bool {
    expected.len() == presented.len()
        && expected
            .bytes()
            .zip(presented.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Check the bearer token presented to a cron endpoint
///
/// With a configured secret the token must match it. Without one, only the
/// development environment is let through.
pub fn authorize(
    config: &CronConfig,
    environment: Environment,
    presented: Option<&str>,
) -> Result<(), AppError> {
    match config.secret.as_deref() {
        Some(secret) => match presented {
            Some(token) if secrets_match(secret, token) => Ok(()),
            Some(_) => Err(AppError::InvalidToken),
            None => Err(AppError::MissingAuth),
        },
        None if environment.is_development() => Ok(()),
        None => Err(AppError::MissingAuth),
    }
}

pub struct CronService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> CronService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Switch off "available now" for partners past the availability window
    #[instrument(skip(self))]
    pub async fn auto_close_available(&self) -> ServiceResult<AutoCloseResponse> {
        let now = Utc::now();
        let cutoff = now - chrono::Duration::minutes(self.ctx.platform().availability_window_minutes);
        let closed = self
            .ctx
            .partner_repo()
            .close_lapsed_availability(cutoff)
            .await?;

        for partner in &closed {
            let event = DomainEvent::PartnerAvailabilityChanged(PartnerAvailabilityChangedEvent {
                partner_id: partner.id,
                is_available_now: false,
                timestamp: now,
            });
            if let Err(e) = self
                .ctx
                .publisher()
                .publish_domain_event(&[PubSubChannel::Broadcast], &event)
                .await
            {
                warn!(partner_id = %partner.id, error = %e, "Failed to publish availability change");
            }
        }

        info!(closed = closed.len(), "Lapsed availability closed");
        Ok(AutoCloseResponse {
            closed_count: closed.len(),
            partners: map_all(&closed),
        })
    }

    pub async fn complete_bookings(&self) -> ServiceResult<CompleteBookingsResponse> {
        BookingService::new(self.ctx).complete_due().await
    }

    /// Referral earnings for recent completed bookings that lack one
    pub async fn calculate_referral_earnings(&self) -> ServiceResult<ReferralSweepResponse> {
        let since = Utc::now() - chrono::Duration::days(self.ctx.platform().referral_lookback_days);
        ReferralService::new(self.ctx).sweep_since(since).await
    }

    /// Run one sweep under the cross-instance lock; skipped while another
    /// instance holds it
    async fn run_locked(&self, job: &'static str, ttl_secs: u64) {
        let lock = match self.ctx.cron_lock().try_acquire(job, ttl_secs).await {
            Ok(Some(lock)) => lock,
            Ok(None) => {
                debug!(job, "Sweep held by another instance");
                return;
            }
            Err(e) => {
                warn!(job, error = %e, "Could not take sweep lock");
                return;
            }
        };

        let result = match job {
            AUTO_CLOSE_JOB => self.auto_close_available().await.map(|_| ()),
            COMPLETE_BOOKINGS_JOB => self.complete_bookings().await.map(|_| ()),
            REFERRAL_EARNINGS_JOB => self.calculate_referral_earnings().await.map(|_| ()),
            _ => Ok(()),
        };
        if let Err(e) = result {
            error!(job, error = %e, "Scheduled sweep failed");
        }

        if let Err(e) = self.ctx.cron_lock().release(lock).await {
            warn!(job, error = %e, "Failed to release sweep lock");
        }
    }
}

/// Start the in-process scheduler; every tick runs all sweeps in turn
pub fn spawn_scheduler(ctx: Arc<ServiceContext>) -> JoinHandle<()> {
    let period = ctx.cron_config().scheduler_interval_secs.max(1);
    info!(interval_secs = period, "Sweep scheduler started");

    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(period));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let cron = CronService::new(&ctx);
            for job in [AUTO_CLOSE_JOB, COMPLETE_BOOKINGS_JOB, REFERRAL_EARNINGS_JOB] {
                cron.run_locked(job, period).await;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: Option<&str>) -> CronConfig {
        CronConfig {
            secret: secret.map(str::to_string),
            scheduler_enabled: false,
            scheduler_interval_secs: 300,
        }
    }

    #[test]
    fn test_authorize_with_secret() {
        let cfg = config(Some("s3cret"));
        assert!(authorize(&cfg, Environment::Production, Some("s3cret")).is_ok());
        assert!(matches!(
            authorize(&cfg, Environment::Production, Some("wrong!")),
            Err(AppError::InvalidToken)
        ));
        assert!(matches!(
            authorize(&cfg, Environment::Development, None),
            Err(AppError::MissingAuth)
        ));
    }

    #[test]
    fn test_authorize_without_secret_is_development_only() {
        let cfg = config(None);
        assert!(authorize(&cfg, Environment::Development, None).is_ok());
        assert!(authorize(&cfg, Environment::Staging, None).is_err());
        assert!(authorize(&cfg, Environment::Production, Some("anything")).is_err());
    }

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match("abc", "abc"));
        assert!(!secrets_match("abc", "abd"));
        assert!(!secrets_match("abc", "abcd"));
    }
}

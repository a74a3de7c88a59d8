//! Periodic removal of expired pending registrations and one-time codes

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Rows removed by one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub pending: u64,
    pub codes: u64,
}

/// Background sweep over the credential store
pub struct ExpirySweeper {
    ctx: ServiceContext,
    period: Duration,
}

impl ExpirySweeper {
    pub fn new(ctx: ServiceContext, period: Duration) -> Self {
        Self { ctx, period }
    }

    /// Delete everything expired as of the context clock
    pub async fn sweep_once(&self) -> ServiceResult<SweepReport> {
        let now = self.ctx.now();
        let pending = self.ctx.pending_repo().delete_expired_pending(now).await?;
        let codes = self.ctx.code_repo().delete_expired_codes(now).await?;
        Ok(SweepReport { pending, codes })
    }

    /// Sweep every period until `shutdown` turns true or its sender is dropped
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(period_secs = self.period.as_secs(), "Expiry sweeper started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.sweep_once().await {
                        Ok(report) if report != SweepReport::default() => {
                            info!(pending = report.pending, codes = report.codes, "Expired rows removed");
                        }
                        Ok(_) => debug!("Nothing expired"),
                        // The next tick retries
                        Err(e) => warn!(error = %e, "Expiry sweep failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Expiry sweeper stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::Harness;
    use crate::services::{TelegramLinkService, VerificationService};
    use chrono::Duration as ChronoDuration;
    use sudu_core::CodePurpose;

    #[tokio::test]
    async fn test_sweep_removes_only_expired_rows() {
        let h = Harness::telegram_mode();
        let links = TelegramLinkService::new(&h.ctx);
        VerificationService::new(&h.ctx)
            .register("Anna", "a@x.io", "pw1")
            .await
            .unwrap();
        links.request_link("a@x.io").await.unwrap();
        links.register_pending("Boris", "b@x.io", "pw1").await.unwrap();

        let sweeper = ExpirySweeper::new(h.ctx.clone(), Duration::from_secs(300));
        assert_eq!(sweeper.sweep_once().await.unwrap(), SweepReport::default());

        // Link code (10 min) expired, pending registration (15 min) still live
        h.clock.advance(ChronoDuration::minutes(11));
        let report = sweeper.sweep_once().await.unwrap();
        assert_eq!(report, SweepReport { pending: 0, codes: 1 });
        assert_eq!(h.store.code_count(CodePurpose::AccountLink), 0);
        assert_eq!(h.store.pending_count(), 1);

        h.clock.advance(ChronoDuration::minutes(5));
        let report = sweeper.sweep_once().await.unwrap();
        assert_eq!(report, SweepReport { pending: 1, codes: 0 });
        assert_eq!(h.store.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_sweep_reports_store_failure() {
        let h = Harness::new();
        h.store.set_available(false);
        let sweeper = ExpirySweeper::new(h.ctx.clone(), Duration::from_secs(300));
        assert!(sweeper.sweep_once().await.is_err());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let h = Harness::new();
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(
            ExpirySweeper::new(h.ctx.clone(), Duration::from_millis(10)).run(rx),
        );

        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper stops")
            .unwrap();
    }
}

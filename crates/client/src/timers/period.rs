//! Background refresh of the period in progress.
//!
//! The refresher polls the timetable on a fixed cadence and publishes the
//! latest [`CurrentPeriod`] on a watch channel. It is best-effort: a failed
//! poll keeps the previously published value and is only logged, in
//! [`RefreshOutcome::record`].

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use schoolhouse_core::CurrentPeriod;

use crate::api::{self, ApiClient, ApiError};

/// Default polling cadence.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Result of one poll.
#[derive(Debug)]
pub enum RefreshOutcome {
    Updated(CurrentPeriod),
    /// No lesson is running right now.
    NoPeriod,
    Failed(ApiError),
}

impl RefreshOutcome {
    /// Poll the backend once.
    pub async fn fetch(api: &ApiClient) -> Self {
        match api::period::fetch_current_period(api).await {
            Ok(Some(period)) => Self::Updated(period),
            Ok(None) => Self::NoPeriod,
            Err(e) => Self::Failed(e),
        }
    }

    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Publish a successful poll; log and drop a failed one.
    ///
    /// `consecutive_failures` counts failures since the last success so a
    /// backend outage is reported once at `warn` and then at `debug`.
    pub fn record(
        self,
        latest: &watch::Sender<Option<CurrentPeriod>>,
        consecutive_failures: &mut u32,
    ) {
        match self {
            Self::Updated(period) => {
                *consecutive_failures = 0;
                latest.send_if_modified(|current| {
                    if current.as_ref() == Some(&period) {
                        return false;
                    }
                    tracing::debug!(period_id = %period.id, subject = %period.subject, "Current period changed");
                    *current = Some(period);
                    true
                });
            }
            Self::NoPeriod => {
                *consecutive_failures = 0;
                latest.send_if_modified(|current| current.take().is_some());
            }
            Self::Failed(e) => {
                *consecutive_failures = consecutive_failures.saturating_add(1);
                if *consecutive_failures == 1 {
                    tracing::warn!(error = %e, "Period refresh failed, keeping last value");
                } else {
                    tracing::debug!(error = %e, failures = *consecutive_failures, "Period refresh still failing");
                }
            }
        }
    }
}

/// Polls the current period until dropped.
pub struct PeriodRefresher {
    latest: watch::Receiver<Option<CurrentPeriod>>,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for PeriodRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeriodRefresher")
            .field("latest", &*self.latest.borrow())
            .finish_non_exhaustive()
    }
}

impl PeriodRefresher {
    /// Start polling every `every`; the first poll runs immediately.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(api: ApiClient, every: Duration) -> Self {
        let every = every.max(Duration::from_millis(1));
        let (tx, latest) = watch::channel(None);

        let task = tokio::spawn(async move {
            tracing::info!(interval_secs = every.as_secs(), "Period refresher started");

            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut consecutive_failures = 0;

            loop {
                ticker.tick().await;
                RefreshOutcome::fetch(&api)
                    .await
                    .record(&tx, &mut consecutive_failures);
            }
        });

        Self { latest, task }
    }

    /// Most recently published period.
    #[must_use]
    pub fn latest(&self) -> Option<CurrentPeriod> {
        self.latest.borrow().clone()
    }

    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Option<CurrentPeriod>> {
        self.latest.clone()
    }
}

impl Drop for PeriodRefresher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

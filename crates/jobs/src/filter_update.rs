use chrono::Utc;
use ferrous_filters_application::events::{EventBus, FilterEvent};
use ferrous_filters_application::services::{
    FilterSettings, FilterUpdateService, UpdateCheckOutcome, UPDATE_FILTERS_PERIOD,
    USE_OPTIMIZED_FILTERS,
};
use ferrous_filters_domain::{DomainError, FilterId};
use std::future::pending;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const DEFAULT_FIRST_CHECK_DELAY_SECS: u64 = 300;
const DEFAULT_ENABLED_FILTER_SKIP_SECS: u64 = 300;

/// Background job driving filter update checks.
///
/// - one check `first_check_delay` after start, then every
///   `update-filters-period` hours (a period of 0 or less disables the timer)
/// - changing `update-filters-period` re-arms the timer from now
/// - changing `use-optimized-filters` reloads every built-in filter
/// - enabling an installed filter whose last check is stale forces a check
///   of that filter alone
pub struct FilterUpdateJob {
    updates: Arc<FilterUpdateService>,
    settings: Arc<FilterSettings>,
    bus: Arc<EventBus>,
    first_check_delay: Duration,
    enabled_filter_skip: Duration,
    shutdown: CancellationToken,
}

impl FilterUpdateJob {
    pub fn new(
        updates: Arc<FilterUpdateService>,
        settings: Arc<FilterSettings>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            updates,
            settings,
            bus,
            first_check_delay: Duration::from_secs(DEFAULT_FIRST_CHECK_DELAY_SECS),
            enabled_filter_skip: Duration::from_secs(DEFAULT_ENABLED_FILTER_SKIP_SECS),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_first_check_delay(mut self, delay: Duration) -> Self {
        self.first_check_delay = delay;
        self
    }

    pub fn with_enabled_filter_skip(mut self, skip: Duration) -> Self {
        self.enabled_filter_skip = skip;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Runs until the cancellation token fires.
    pub async fn start(self: Arc<Self>) {
        info!(
            first_check_delay_secs = self.first_check_delay.as_secs(),
            "Starting filter update job"
        );

        let mut settings_changes = self.settings.subscribe();
        let (enabled_tx, mut enabled_rx) = mpsc::unbounded_channel::<FilterId>();
        let skip = chrono::Duration::from_std(self.enabled_filter_skip)
            .unwrap_or_else(|_| chrono::Duration::zero());
        let subscription = self.bus.subscribe(move |event| {
            let FilterEvent::FilterEnabledChanged { filter } = event else {
                return;
            };
            if !filter.is_enabled() || !filter.is_installed() {
                return;
            }
            let stale = filter
                .version
                .last_check_time
                .map_or(true, |last| Utc::now() - last >= skip);
            if stale {
                let _ = enabled_tx.send(filter.id);
            }
        });

        let mut next_check = Some(Instant::now() + self.first_check_delay);
        let mut settings_open = true;

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    info!("FilterUpdateJob: shutting down");
                    break;
                }
                _ = wait_until(next_check) => {
                    info!("FilterUpdateJob: running scheduled update check");
                    log_outcome("scheduled", self.updates.check_for_updates(false).await);
                    next_check = self.next_periodic_check().await;
                }
                Some(filter_id) = enabled_rx.recv() => {
                    debug!(filter_id, "FilterUpdateJob: checking newly enabled filter");
                    log_outcome("enabled filter", self.updates.check_filters(&[filter_id]).await);
                }
                change = settings_changes.recv(), if settings_open => match change {
                    Ok(change) if &*change.name == UPDATE_FILTERS_PERIOD => {
                        next_check = self.next_periodic_check().await;
                        info!(
                            armed = next_check.is_some(),
                            "FilterUpdateJob: update period changed"
                        );
                    }
                    Ok(change) if &*change.name == USE_OPTIMIZED_FILTERS => {
                        info!("FilterUpdateJob: optimized filters setting changed, reloading");
                        log_outcome("reload", self.updates.reload_all_filters().await);
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "FilterUpdateJob: missed setting changes");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        settings_open = false;
                    }
                },
            }
        }

        self.bus.unsubscribe(subscription);
    }

    async fn next_periodic_check(&self) -> Option<Instant> {
        let hours = self.settings.update_period_hours().await;
        if hours <= 0 {
            return None;
        }
        Some(Instant::now() + Duration::from_secs(hours as u64 * 3600))
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}

fn log_outcome(trigger: &str, result: Result<UpdateCheckOutcome, DomainError>) {
    match result {
        Ok(outcome) => info!(
            trigger,
            checked = outcome.checked.len(),
            updated = outcome.updated.len(),
            failed = outcome.failed.len(),
            "FilterUpdateJob: update check completed"
        ),
        Err(e) => error!(trigger, error = %e, "FilterUpdateJob: update check failed"),
    }
}

use crate::events::{EventBus, FilterEvent};
use crate::ports::FilterDownloadClient;
use crate::services::filter_registry::FilterRegistry;
use crate::services::settings::FilterSettings;
use chrono::{DateTime, Duration, Utc};
use ferrous_filters_domain::filter_version::is_greater_version;
use ferrous_filters_domain::{DomainError, Filter, FilterId, RemoteFilterMetadata};
use futures::future::join_all;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateCheckState {
    Idle,
    Checking,
}

/// Result of one update check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateCheckOutcome {
    /// Filters whose check completed, whether or not they were downloaded.
    pub checked: Vec<FilterId>,
    pub updated: Vec<FilterId>,
    pub failed: Vec<FilterId>,
}

#[derive(Clone, Copy)]
enum CheckMode {
    /// Compare remote versions and download strictly newer ones.
    Versioned { force: bool },
    /// Download every candidate built-in filter regardless of version.
    Reload,
}

struct Download {
    filter: Filter,
    remote: Option<RemoteFilterMetadata>,
}

/// Decides which filters are stale and refreshes them. Checks never overlap;
/// a request made during a check waits for it to finish.
pub struct FilterUpdateService {
    registry: Arc<FilterRegistry>,
    downloader: Arc<dyn FilterDownloadClient>,
    settings: Arc<FilterSettings>,
    bus: Arc<EventBus>,
    check_lock: Mutex<()>,
    checking: AtomicBool,
}

impl FilterUpdateService {
    pub fn new(
        registry: Arc<FilterRegistry>,
        downloader: Arc<dyn FilterDownloadClient>,
        settings: Arc<FilterSettings>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            registry,
            downloader,
            settings,
            bus,
            check_lock: Mutex::new(()),
            checking: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> UpdateCheckState {
        if self.checking.load(Ordering::Acquire) {
            UpdateCheckState::Checking
        } else {
            UpdateCheckState::Idle
        }
    }

    #[instrument(skip(self))]
    pub async fn check_for_updates(&self, force_all: bool) -> Result<UpdateCheckOutcome, DomainError> {
        self.run(CheckMode::Versioned { force: force_all }, None).await
    }

    /// Forced check restricted to the given filters.
    #[instrument(skip(self))]
    pub async fn check_filters(&self, filter_ids: &[FilterId]) -> Result<UpdateCheckOutcome, DomainError> {
        self.run(CheckMode::Versioned { force: true }, Some(filter_ids))
            .await
    }

    /// Downloads every installed, enabled built-in filter again, e.g. after
    /// the optimized-variant setting changed.
    #[instrument(skip(self))]
    pub async fn reload_all_filters(&self) -> Result<UpdateCheckOutcome, DomainError> {
        self.run(CheckMode::Reload, None).await
    }

    async fn run(
        &self,
        mode: CheckMode,
        only: Option<&[FilterId]>,
    ) -> Result<UpdateCheckOutcome, DomainError> {
        let _guard = self.check_lock.lock().await;
        self.checking.store(true, Ordering::Release);
        let result = self.check(mode, only).await;
        self.checking.store(false, Ordering::Release);
        result
    }

    async fn check(
        &self,
        mode: CheckMode,
        only: Option<&[FilterId]>,
    ) -> Result<UpdateCheckOutcome, DomainError> {
        let forced = !matches!(mode, CheckMode::Versioned { force: false });
        self.bus.publish(FilterEvent::UpdateCheckStarted { forced });

        let now = Utc::now();
        let hours = self.settings.update_period_hours().await;
        let period = (hours > 0).then(|| Duration::hours(hours));
        let candidates = match self
            .registry
            .filters_due_for_update(forced, now, period, only)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                self.publish_failed(forced, &e);
                return Err(e);
            }
        };

        let (built_in, custom): (Vec<Filter>, Vec<Filter>) =
            candidates.into_iter().partition(|f| !f.is_custom());

        let mut outcome = UpdateCheckOutcome::default();
        let mut downloads: Vec<Download> = Vec::new();
        let mut up_to_date: Vec<FilterId> = Vec::new();

        match mode {
            CheckMode::Reload => {
                downloads.extend(built_in.into_iter().map(|filter| Download {
                    filter,
                    remote: None,
                }));
            }
            CheckMode::Versioned { .. } => {
                if !built_in.is_empty() {
                    let ids: Vec<FilterId> = built_in.iter().map(|f| f.id).collect();
                    let remote = match self.downloader.fetch_filters_metadata(&ids).await {
                        Ok(remote) => remote,
                        Err(e) => {
                            error!(filters = ids.len(), error = %e, "Filter metadata fetch failed");
                            self.publish_failed(forced, &e);
                            return Err(e);
                        }
                    };
                    let mut remote: FxHashMap<FilterId, RemoteFilterMetadata> =
                        remote.into_iter().map(|m| (m.filter_id, m)).collect();

                    for filter in built_in {
                        match remote.remove(&filter.id) {
                            Some(meta) if is_greater_version(&meta.version, &filter.version.version) => {
                                downloads.push(Download {
                                    filter,
                                    remote: Some(meta),
                                });
                            }
                            _ => up_to_date.push(filter.id),
                        }
                    }
                }
                downloads.extend(custom.into_iter().map(|filter| Download {
                    filter,
                    remote: None,
                }));
            }
        }

        debug!(
            downloads = downloads.len(),
            up_to_date = up_to_date.len(),
            "Update check candidates selected"
        );

        let use_optimized = self.settings.use_optimized_filters().await;
        let results = join_all(
            downloads
                .into_iter()
                .map(|download| self.download(download, use_optimized, now)),
        )
        .await;

        for (filter_id, result) in results {
            match result {
                Ok(()) => {
                    outcome.updated.push(filter_id);
                    outcome.checked.push(filter_id);
                }
                Err(e) => {
                    warn!(filter_id, error = %e, "Filter update failed");
                    self.bus.publish(FilterEvent::FilterDownloadFailed {
                        filter_id,
                        reason: e.to_string(),
                    });
                    outcome.failed.push(filter_id);
                }
            }
        }

        if let Err(e) = self.registry.mark_checked(&up_to_date, now).await {
            warn!(error = %e, "Failed to record check time");
        }
        outcome.checked.extend(up_to_date);
        outcome.checked.sort_unstable();

        info!(
            forced,
            checked = outcome.checked.len(),
            updated = outcome.updated.len(),
            failed = outcome.failed.len(),
            "Filter update check finished"
        );

        if outcome.failed.is_empty() {
            self.bus.publish(FilterEvent::UpdateCheckSucceeded {
                forced,
                updated: outcome.updated.clone(),
            });
        } else {
            self.bus.publish(FilterEvent::UpdateCheckFailed {
                forced,
                reason: format!("{} filter(s) failed to update", outcome.failed.len()),
            });
        }

        Ok(outcome)
    }

    async fn download(
        &self,
        download: Download,
        use_optimized: bool,
        now: DateTime<Utc>,
    ) -> (FilterId, Result<(), DomainError>) {
        let filter = download.filter;
        let filter_id = filter.id;
        self.bus
            .publish(FilterEvent::FilterDownloadStarted { filter_id });

        let result = match filter.custom_url() {
            Some(url) => match self.downloader.fetch_rules_by_url(url).await {
                Ok(rules) => {
                    self.registry
                        .apply_custom_filter_update(filter_id, rules, now)
                        .await
                }
                Err(e) => Err(e),
            },
            None => match self
                .downloader
                .fetch_filter_rules(filter_id, use_optimized)
                .await
            {
                Ok(rules) => {
                    let (version, time_updated) = match download.remote {
                        Some(meta) => (meta.version, meta.time_updated),
                        None => (filter.version.version.clone(), None),
                    };
                    self.registry
                        .apply_filter_update(filter_id, version, time_updated, rules, now)
                        .await
                }
                Err(e) => Err(e),
            },
        };

        (filter_id, result)
    }

    fn publish_failed(&self, forced: bool, error: &DomainError) {
        self.bus.publish(FilterEvent::UpdateCheckFailed {
            forced,
            reason: error.to_string(),
        });
    }
}

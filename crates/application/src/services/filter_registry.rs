use crate::events::{EventBus, FilterEvent};
use crate::ports::{
    FilterCatalogPort, FilterDownloadClient, FilterStateRepository, FilterStateSnapshot,
    RuleStorage,
};
use crate::services::settings::FilterSettings;
use chrono::{DateTime, Duration, Utc};
use ferrous_filters_domain::{
    parse_filter_header, DomainError, Filter, FilterGroup, FilterHeader, FilterId,
    FilterMetadata, FilterSource, FilterState, FilterVersionInfo, GroupId,
    CUSTOM_FILTERS_GROUP_ID, CUSTOM_FILTERS_START_ID, USER_FILTER_ID,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell, RwLock};
use tracing::{debug, info, instrument, warn};

const CUSTOM_GROUP_NAME: &str = "Custom";
const CUSTOM_GROUP_DISPLAY_NUMBER: i32 = 99;

struct RegistryData {
    filters: BTreeMap<FilterId, Filter>,
    groups: BTreeMap<GroupId, FilterGroup>,
}

impl RegistryData {
    fn active_filter(&self, filter_id: FilterId) -> Result<&Filter, DomainError> {
        self.filters
            .get(&filter_id)
            .filter(|f| !f.is_removed())
            .ok_or(DomainError::FilterNotFound(filter_id))
    }

    fn next_custom_id(&self) -> FilterId {
        let max = self.filters.keys().next_back().copied().unwrap_or(0);
        if max >= CUSTOM_FILTERS_START_ID {
            max + 1
        } else {
            CUSTOM_FILTERS_START_ID
        }
    }

    fn group_is_enabled(&self, group_id: GroupId) -> bool {
        self.groups
            .get(&group_id)
            .map(FilterGroup::is_enabled)
            .unwrap_or(true)
    }
}

/// In-memory view of every known filter and group.
///
/// Populated on first use from the catalog and the persisted snapshots. Every
/// mutation publishes an event; rule text and enabled-state persistence is
/// left to the change batcher listening on the bus.
pub struct FilterRegistry {
    catalog: Arc<dyn FilterCatalogPort>,
    state_repo: Arc<dyn FilterStateRepository>,
    storage: Arc<dyn RuleStorage>,
    downloader: Arc<dyn FilterDownloadClient>,
    settings: Arc<FilterSettings>,
    bus: Arc<EventBus>,
    data: OnceCell<RwLock<RegistryData>>,
    mutation: Mutex<()>,
}

impl FilterRegistry {
    pub fn new(
        catalog: Arc<dyn FilterCatalogPort>,
        state_repo: Arc<dyn FilterStateRepository>,
        storage: Arc<dyn RuleStorage>,
        downloader: Arc<dyn FilterDownloadClient>,
        settings: Arc<FilterSettings>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            catalog,
            state_repo,
            storage,
            downloader,
            settings,
            bus,
            data: OnceCell::new(),
            mutation: Mutex::new(()),
        }
    }

    pub async fn ensure_loaded(&self) -> Result<(), DomainError> {
        self.data().await.map(|_| ())
    }

    async fn data(&self) -> Result<&RwLock<RegistryData>, DomainError> {
        self.data
            .get_or_try_init(|| async { self.load().await.map(RwLock::new) })
            .await
    }

    async fn load(&self) -> Result<RegistryData, DomainError> {
        let catalog = self.catalog.load_catalog().await?;
        let custom_filters = self.state_repo.load_custom_filters().await?;
        let versions = self.state_repo.load_versions().await?;
        let states = self.state_repo.load_states().await?;
        let group_states = self.state_repo.load_group_states().await?;

        let mut filters: BTreeMap<FilterId, Filter> = BTreeMap::new();
        for filter in catalog.filters.into_iter().chain(custom_filters) {
            filters.insert(filter.id, filter);
        }
        for filter in filters.values_mut() {
            if let Some(version) = versions.get(&filter.id) {
                filter.version = version.clone();
            }
            if let Some(snapshot) = states.get(&filter.id) {
                filter.state = snapshot.state;
                filter.lifecycle = snapshot.lifecycle;
            }
        }

        let mut groups: BTreeMap<GroupId, FilterGroup> = catalog
            .groups
            .into_iter()
            .map(|g| (g.group_id, g))
            .collect();
        groups.entry(CUSTOM_FILTERS_GROUP_ID).or_insert_with(|| {
            FilterGroup::new(
                CUSTOM_FILTERS_GROUP_ID,
                Arc::from(CUSTOM_GROUP_NAME),
                CUSTOM_GROUP_DISPLAY_NUMBER,
            )
        });
        for (group_id, enabled) in group_states {
            if let Some(group) = groups.get_mut(&group_id) {
                group.enabled = Some(enabled);
            }
        }

        info!(
            filters = filters.len(),
            groups = groups.len(),
            "Filter registry loaded"
        );

        Ok(RegistryData { filters, groups })
    }

    /// Every filter that has not been removed, in display order.
    pub async fn get_all_filters(&self) -> Result<Vec<Filter>, DomainError> {
        let data = self.data().await?.read().await;
        let mut filters: Vec<Filter> = data
            .filters
            .values()
            .filter(|f| !f.is_removed())
            .cloned()
            .collect();
        filters.sort_by_key(|f| (f.metadata.display_number, f.id));
        Ok(filters)
    }

    pub async fn get_groups(&self) -> Result<Vec<FilterGroup>, DomainError> {
        let data = self.data().await?.read().await;
        let mut groups: Vec<FilterGroup> = data.groups.values().cloned().collect();
        groups.sort_by_key(|g| (g.display_number, g.group_id));
        Ok(groups)
    }

    pub async fn get_filter(&self, filter_id: FilterId) -> Result<Filter, DomainError> {
        let data = self.data().await?.read().await;
        data.active_filter(filter_id).cloned()
    }

    /// Enables or disables filters, installing the ones that were never
    /// downloaded. Unknown ids fail the whole call before anything changes;
    /// an install failure leaves that filter disabled and is returned after
    /// the remaining ids have been processed.
    #[instrument(skip(self))]
    pub async fn set_enabled(&self, filter_ids: &[FilterId], enabled: bool) -> Result<(), DomainError> {
        let data = self.data().await?;
        let _guard = self.mutation.lock().await;

        let mut ids = Vec::with_capacity(filter_ids.len());
        for id in filter_ids {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }

        {
            let data = data.read().await;
            for id in &ids {
                data.active_filter(*id)?;
            }
        }

        let mut first_error = None;
        for id in ids {
            if let Err(e) = self.set_filter_enabled(data, id, enabled).await {
                warn!(filter_id = id, error = %e, "Failed to change filter state");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn set_filter_enabled(
        &self,
        data: &RwLock<RegistryData>,
        filter_id: FilterId,
        enabled: bool,
    ) -> Result<(), DomainError> {
        let filter = data.read().await.active_filter(filter_id)?.clone();
        if filter.state.enabled == enabled {
            debug!(filter_id, enabled, "Filter already in requested state");
            return Ok(());
        }

        let installed_version = if enabled && !filter.is_installed() {
            Some(self.install(&filter).await?)
        } else {
            None
        };

        let (updated, group_change) = {
            let mut data = data.write().await;
            let entry = data
                .filters
                .get_mut(&filter_id)
                .ok_or(DomainError::FilterNotFound(filter_id))?;
            entry.state.enabled = enabled;
            if let Some(version) = installed_version {
                entry.state.installed = true;
                entry.state.loaded = true;
                entry.version = version;
            }
            let updated = entry.clone();

            let group_change = if enabled {
                data.groups.get_mut(&updated.group_id).and_then(|group| {
                    let auto_enable = !group.has_enabled_status()
                        || (group.group_id == CUSTOM_FILTERS_GROUP_ID && !group.is_enabled());
                    auto_enable.then(|| {
                        group.enabled = Some(true);
                        group.clone()
                    })
                })
            } else {
                None
            };
            (updated, group_change)
        };

        if let Some(group) = group_change {
            info!(group_id = group.group_id, "Group enabled with its first filter");
            self.bus.publish(FilterEvent::GroupEnabledChanged { group });
        }

        info!(filter_id, enabled, "Filter state changed");
        self.bus.publish(FilterEvent::FilterEnabledChanged {
            filter: Arc::new(updated),
        });
        Ok(())
    }

    /// Downloads and persists rule text, then the version and installed
    /// state. Nothing is marked installed unless every step succeeded.
    async fn install(&self, filter: &Filter) -> Result<FilterVersionInfo, DomainError> {
        let filter_id = filter.id;
        self.bus
            .publish(FilterEvent::FilterDownloadStarted { filter_id });

        let result = async {
            let rules = self.download(filter).await?;
            self.storage.write(filter_id, &rules).await?;

            let now = Utc::now();
            let version = FilterVersionInfo {
                version: filter.version.version.clone(),
                last_check_time: Some(now),
                last_update_time: Some(now),
            };
            self.state_repo.save_version(filter_id, &version).await?;

            let mut state = filter.state;
            state.installed = true;
            state.loaded = true;
            self.state_repo
                .save_state(
                    filter_id,
                    FilterStateSnapshot {
                        state,
                        lifecycle: filter.lifecycle,
                    },
                )
                .await?;

            info!(filter_id, rules = rules.len(), "Filter installed");
            Ok::<_, DomainError>((version, state))
        }
        .await;

        match result {
            Ok((version, state)) => {
                let mut installed = filter.clone();
                installed.state = state;
                installed.version = version.clone();
                self.bus.publish(FilterEvent::FilterDownloadSucceeded {
                    filter: Arc::new(installed),
                });
                Ok(version)
            }
            Err(e) => {
                warn!(filter_id, error = %e, "Filter install failed");
                self.bus.publish(FilterEvent::FilterDownloadFailed {
                    filter_id,
                    reason: e.to_string(),
                });
                Err(DomainError::FilterInstallFailed {
                    filter_id,
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn download(&self, filter: &Filter) -> Result<Vec<String>, DomainError> {
        match &filter.source {
            FilterSource::BuiltIn => {
                let use_optimized = self.settings.use_optimized_filters().await;
                self.downloader
                    .fetch_filter_rules(filter.id, use_optimized)
                    .await
            }
            FilterSource::Custom { url, .. } => self.downloader.fetch_rules_by_url(url).await,
        }
    }

    #[instrument(skip(self))]
    pub async fn set_group_enabled(&self, group_id: GroupId, enabled: bool) -> Result<(), DomainError> {
        let data = self.data().await?;
        let _guard = self.mutation.lock().await;

        let group = {
            let mut data = data.write().await;
            let group = data
                .groups
                .get_mut(&group_id)
                .ok_or(DomainError::GroupNotFound(group_id))?;
            if group.enabled == Some(enabled) {
                return Ok(());
            }
            group.enabled = Some(enabled);
            group.clone()
        };

        info!(group_id, enabled, "Group state changed");
        self.bus.publish(FilterEvent::GroupEnabledChanged { group });
        Ok(())
    }

    /// Soft-deletes a custom filter. The removed state is persisted before the
    /// in-memory view changes; the filter stops contributing (enable-disable)
    /// before its removal is announced (add-remove).
    #[instrument(skip(self))]
    pub async fn remove_custom_filter(&self, filter_id: FilterId) -> Result<(), DomainError> {
        let data = self.data().await?;
        let _guard = self.mutation.lock().await;

        let filter = data
            .read()
            .await
            .filters
            .get(&filter_id)
            .cloned()
            .ok_or(DomainError::FilterNotFound(filter_id))?;
        if !filter.is_custom() {
            return Err(DomainError::NotCustomFilter(filter_id));
        }
        if filter.is_removed() {
            debug!(filter_id, "Custom filter already removed");
            return Ok(());
        }

        let mut removed = filter;
        removed.mark_removed();
        self.state_repo
            .save_state(
                filter_id,
                FilterStateSnapshot {
                    state: removed.state,
                    lifecycle: removed.lifecycle,
                },
            )
            .await?;

        data.write().await.filters.insert(filter_id, removed.clone());

        info!(filter_id, "Custom filter removed");
        let removed = Arc::new(removed);
        self.bus.publish(FilterEvent::FilterEnabledChanged {
            filter: Arc::clone(&removed),
        });
        self.bus
            .publish(FilterEvent::FilterAddedRemoved { filter: removed });
        Ok(())
    }

    /// Subscribes to a custom filter list. A URL that is already known
    /// updates that filter in place, reviving it if it had been removed.
    #[instrument(skip(self))]
    pub async fn add_custom_filter(
        &self,
        url: &str,
        title: Option<&str>,
        trusted: bool,
    ) -> Result<Filter, DomainError> {
        validate_subscription_url(url)?;
        let data = self.data().await?;
        let _guard = self.mutation.lock().await;

        let (existing, filter_id) = {
            let data = data.read().await;
            let existing = data
                .filters
                .values()
                .find(|f| f.custom_url() == Some(url))
                .cloned();
            let id = existing
                .as_ref()
                .map(|f| f.id)
                .unwrap_or_else(|| data.next_custom_id());
            (existing, id)
        };

        self.bus
            .publish(FilterEvent::FilterDownloadStarted { filter_id });
        let rules = match self.downloader.fetch_rules_by_url(url).await {
            Ok(rules) => rules,
            Err(e) => {
                warn!(filter_id, url, error = %e, "Custom filter download failed");
                self.bus.publish(FilterEvent::FilterDownloadFailed {
                    filter_id,
                    reason: e.to_string(),
                });
                return Err(DomainError::FilterInstallFailed {
                    filter_id,
                    reason: e.to_string(),
                });
            }
        };

        let now = Utc::now();
        let header = parse_filter_header(&rules);
        let fallback_title = title.unwrap_or(url);
        let version = header.version.clone().unwrap_or_default();
        let metadata = metadata_from_header(header, fallback_title, now);

        let update_in_place = existing
            .as_ref()
            .is_some_and(|f| !f.is_removed() && f.is_installed());

        // Rule text first: a failed write leaves the previous version in place.
        if let Err(e) = self.storage.write(filter_id, &rules).await {
            self.bus.publish(FilterEvent::FilterDownloadFailed {
                filter_id,
                reason: e.to_string(),
            });
            return Err(DomainError::FilterInstallFailed {
                filter_id,
                reason: e.to_string(),
            });
        }

        let mut filter = match existing {
            Some(mut previous) if update_in_place => {
                previous.metadata = FilterMetadata {
                    display_number: previous.metadata.display_number,
                    ..metadata
                };
                previous
            }
            Some(mut previous) => {
                previous.revive();
                previous.metadata = metadata;
                previous.state = FilterState::default();
                previous
            }
            None => Filter::custom(filter_id, metadata, url, trusted, &version),
        };
        filter.source = FilterSource::Custom {
            url: Arc::from(url),
            trusted,
        };
        filter.version = FilterVersionInfo {
            version: Arc::from(version.as_str()),
            last_check_time: Some(now),
            last_update_time: Some(now),
        };
        if !update_in_place {
            filter.state.installed = true;
            filter.state.loaded = true;
        }

        self.state_repo.save_custom_filter(&filter).await?;
        self.state_repo
            .save_version(filter_id, &filter.version)
            .await?;
        self.state_repo
            .save_state(
                filter_id,
                FilterStateSnapshot {
                    state: filter.state,
                    lifecycle: filter.lifecycle,
                },
            )
            .await?;

        data.write().await.filters.insert(filter_id, filter.clone());

        let shared = Arc::new(filter.clone());
        self.bus.publish(FilterEvent::FilterDownloadSucceeded {
            filter: Arc::clone(&shared),
        });
        if update_in_place {
            info!(filter_id, url, rules = rules.len(), "Custom filter updated");
            self.bus
                .publish(FilterEvent::FilterRulesReplaced { filter_id, rules });
        } else {
            info!(filter_id, url, rules = rules.len(), "Custom filter added");
            self.bus
                .publish(FilterEvent::FilterAddedRemoved { filter: shared });
        }

        Ok(filter)
    }

    pub fn add_user_rules(&self, rules: Vec<String>) {
        self.bus.publish(FilterEvent::RulesAdded {
            filter_id: USER_FILTER_ID,
            rules,
        });
    }

    pub fn remove_user_rule(&self, rule: String) {
        self.bus.publish(FilterEvent::RuleRemoved {
            filter_id: USER_FILTER_ID,
            rule,
        });
    }

    pub fn set_user_rules(&self, rules: Vec<String>) {
        self.bus.publish(FilterEvent::FilterRulesReplaced {
            filter_id: USER_FILTER_ID,
            rules,
        });
    }

    /// Persisted user rules; pending edits are visible after the next flush.
    pub async fn get_user_rules(&self) -> Result<Vec<String>, DomainError> {
        Ok(self.storage.read(USER_FILTER_ID).await?.unwrap_or_default())
    }

    /// Filters whose rules go into the active set, ascending by id, with
    /// their trust flag. The user filter is not included.
    pub async fn contributing_filters(&self) -> Result<Vec<(FilterId, bool)>, DomainError> {
        let data = self.data().await?.read().await;
        Ok(data
            .filters
            .values()
            .filter(|f| f.id != USER_FILTER_ID && f.is_enabled())
            .filter(|f| data.group_is_enabled(f.group_id))
            .map(|f| (f.id, f.is_trusted()))
            .collect())
    }

    /// Installed and enabled filters due for an update check, optionally
    /// restricted to `only`.
    pub async fn filters_due_for_update(
        &self,
        force: bool,
        now: DateTime<Utc>,
        period: Option<Duration>,
        only: Option<&[FilterId]>,
    ) -> Result<Vec<Filter>, DomainError> {
        let data = self.data().await?.read().await;
        Ok(data
            .filters
            .values()
            .filter(|f| only.map_or(true, |ids| ids.contains(&f.id)))
            .filter(|f| f.is_due_for_check(now, period, force))
            .cloned()
            .collect())
    }

    /// Writes the new rule text, then records the newer version and hands
    /// the rules to the batcher as a replace so the active set is rebuilt.
    pub async fn apply_filter_update(
        &self,
        filter_id: FilterId,
        version: Arc<str>,
        time_updated: Option<DateTime<Utc>>,
        rules: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let data = self.data().await?;
        let _guard = self.mutation.lock().await;

        if !data.read().await.filters.contains_key(&filter_id) {
            return Err(DomainError::FilterNotFound(filter_id));
        }

        // The version only advances once the new rule text is on disk.
        self.storage.write(filter_id, &rules).await?;

        let info = FilterVersionInfo {
            version,
            last_check_time: Some(now),
            last_update_time: Some(now),
        };
        self.state_repo.save_version(filter_id, &info).await?;

        let updated = {
            let mut data = data.write().await;
            let entry = data
                .filters
                .get_mut(&filter_id)
                .ok_or(DomainError::FilterNotFound(filter_id))?;
            entry.version = info;
            if time_updated.is_some() {
                entry.metadata.time_updated = time_updated;
            }
            entry.clone()
        };

        info!(
            filter_id,
            version = %updated.version.version,
            rules = rules.len(),
            "Filter updated"
        );
        self.bus.publish(FilterEvent::FilterDownloadSucceeded {
            filter: Arc::new(updated),
        });
        self.bus
            .publish(FilterEvent::FilterRulesReplaced { filter_id, rules });
        Ok(())
    }

    /// Same as [`apply_filter_update`](Self::apply_filter_update) with the
    /// version and metadata taken from the list's own header.
    pub async fn apply_custom_filter_update(
        &self,
        filter_id: FilterId,
        rules: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let header = parse_filter_header(&rules);
        let current = self.get_filter(filter_id).await?;
        let version = header
            .version
            .as_deref()
            .map(Arc::from)
            .unwrap_or_else(|| current.version.version.clone());
        let time_updated = header.time_updated.as_deref().and_then(parse_time_updated);
        self.apply_filter_update(filter_id, version, time_updated, rules, now)
            .await
    }

    /// Advances the last check time of filters whose check completed
    /// without a download.
    pub async fn mark_checked(&self, filter_ids: &[FilterId], now: DateTime<Utc>) -> Result<(), DomainError> {
        let data = self.data().await?;
        let _guard = self.mutation.lock().await;

        for filter_id in filter_ids {
            let version = {
                let data = data.read().await;
                let Some(filter) = data.filters.get(filter_id) else {
                    continue;
                };
                FilterVersionInfo {
                    last_check_time: Some(now),
                    ..filter.version.clone()
                }
            };
            if let Err(e) = self.state_repo.save_version(*filter_id, &version).await {
                warn!(filter_id, error = %e, "Failed to persist check time");
                continue;
            }
            if let Some(filter) = data.write().await.filters.get_mut(filter_id) {
                filter.version = version;
            }
            self.bus.publish(FilterEvent::FilterMetadataUpdated {
                filter_id: *filter_id,
            });
        }
        Ok(())
    }
}

fn validate_subscription_url(url: &str) -> Result<(), DomainError> {
    let valid = ["http://", "https://", "file://"]
        .iter()
        .any(|scheme| url.len() > scheme.len() && url.starts_with(scheme));
    if valid {
        Ok(())
    } else {
        Err(DomainError::InvalidFilterUrl(url.to_string()))
    }
}

fn metadata_from_header(header: FilterHeader, fallback_title: &str, now: DateTime<Utc>) -> FilterMetadata {
    FilterMetadata {
        name: Arc::from(header.title.as_deref().unwrap_or(fallback_title)),
        description: Arc::from(header.description.as_deref().unwrap_or_default()),
        homepage: header.homepage.as_deref().map(Arc::from),
        tags: vec![0],
        languages: Vec::new(),
        display_number: 0,
        expires: header.expires.as_deref().and_then(parse_expires),
        time_updated: Some(
            header
                .time_updated
                .as_deref()
                .and_then(parse_time_updated)
                .unwrap_or(now),
        ),
    }
}

// "4 days (update frequency)" -> 4
fn parse_expires(value: &str) -> Option<i64> {
    value.split_whitespace().next()?.parse().ok()
}

fn parse_time_updated(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

use crate::events::EventBus;
use crate::ports::{
    FilterCatalogPort, FilterDownloadClient, FilterStateRepository, RuleStorage, SettingsStore,
};
use crate::services::{
    ChangeBatcher, FilterRegistry, FilterSettings, FilterUpdateService, RuleAggregator,
    UpdateCheckOutcome,
};
use ferrous_filters_domain::config::EngineConfig;
use ferrous_filters_domain::{DomainError, Filter, FilterId, GroupId};
use std::sync::Arc;
use tracing::info;

/// Collaborators the engine is built from.
#[derive(Clone)]
pub struct EnginePorts {
    pub catalog: Arc<dyn FilterCatalogPort>,
    pub state_repo: Arc<dyn FilterStateRepository>,
    pub storage: Arc<dyn RuleStorage>,
    pub settings_store: Arc<dyn SettingsStore>,
    pub downloader: Arc<dyn FilterDownloadClient>,
}

/// Context object constructed once at startup and shared by every caller.
pub struct FilterEngine {
    pub bus: Arc<EventBus>,
    pub settings: Arc<FilterSettings>,
    pub registry: Arc<FilterRegistry>,
    pub aggregator: Arc<RuleAggregator>,
    pub updates: Arc<FilterUpdateService>,
    pub batcher: Arc<ChangeBatcher>,
}

impl FilterEngine {
    /// Wires the components, starts the change batcher, loads the registry
    /// and builds the first active rule set.
    pub async fn start(
        ports: EnginePorts,
        config: &EngineConfig,
        default_period_hours: i64,
    ) -> Result<Self, DomainError> {
        let bus = Arc::new(EventBus::new()?);
        let settings = Arc::new(FilterSettings::new(
            Arc::clone(&ports.settings_store),
            default_period_hours,
        ));

        let registry = Arc::new(FilterRegistry::new(
            ports.catalog,
            Arc::clone(&ports.state_repo),
            Arc::clone(&ports.storage),
            Arc::clone(&ports.downloader),
            Arc::clone(&settings),
            Arc::clone(&bus),
        ));

        let aggregator = Arc::new(RuleAggregator::new(
            Arc::clone(&registry),
            Arc::clone(&ports.storage),
            Arc::clone(&bus),
        ));

        let updates = Arc::new(FilterUpdateService::new(
            Arc::clone(&registry),
            ports.downloader,
            Arc::clone(&settings),
            Arc::clone(&bus),
        ));

        let batcher = Arc::new(ChangeBatcher::spawn(
            Arc::clone(&bus),
            ports.storage,
            ports.state_repo,
            Arc::clone(&aggregator),
            config.debounce_window(),
        ));

        registry.ensure_loaded().await?;
        let rule_set = aggregator.rebuild().await?;
        info!(rules = rule_set.len(), "Filter engine started");

        Ok(Self {
            bus,
            settings,
            registry,
            aggregator,
            updates,
            batcher,
        })
    }

    pub async fn get_filters(&self) -> Result<Vec<Filter>, DomainError> {
        self.registry.get_all_filters().await
    }

    pub async fn set_enabled(&self, filter_ids: &[FilterId], enabled: bool) -> Result<(), DomainError> {
        self.registry.set_enabled(filter_ids, enabled).await
    }

    pub async fn set_group_enabled(&self, group_id: GroupId, enabled: bool) -> Result<(), DomainError> {
        self.registry.set_group_enabled(group_id, enabled).await
    }

    pub async fn add_custom_filter(
        &self,
        url: &str,
        title: Option<&str>,
        trusted: bool,
    ) -> Result<Filter, DomainError> {
        self.registry.add_custom_filter(url, title, trusted).await
    }

    pub async fn remove_custom_filter(&self, filter_id: FilterId) -> Result<(), DomainError> {
        self.registry.remove_custom_filter(filter_id).await
    }

    /// Size of the last published active set.
    pub fn get_active_rule_count(&self) -> usize {
        self.aggregator.rule_count()
    }

    pub async fn force_update_check(&self) -> Result<UpdateCheckOutcome, DomainError> {
        self.updates.check_for_updates(true).await
    }

    /// Flushes pending changes and stops the batcher.
    pub async fn shutdown(&self) {
        self.batcher.shutdown().await;
        info!(
            subscribers = self.bus.subscriber_count(),
            "Filter engine stopped"
        );
    }
}

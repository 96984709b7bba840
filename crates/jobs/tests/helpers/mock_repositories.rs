#![allow(dead_code)]

use async_trait::async_trait;
use ferrous_filters_application::events::{EventBus, FilterEvent};
use ferrous_filters_application::ports::{
    FilterCatalogPort, FilterDownloadClient, FilterStateRepository, FilterStateSnapshot,
    RuleStorage, SettingChange, SettingsStore,
};
use ferrous_filters_application::{EnginePorts, FilterEngine};
use ferrous_filters_domain::config::EngineConfig;
use ferrous_filters_domain::{
    DomainError, Filter, FilterCatalog, FilterGroup, FilterId, FilterLifecycle, FilterMetadata,
    FilterState, FilterVersionInfo, GroupId, RemoteFilterMetadata,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, RwLock};

#[derive(Clone, Default)]
pub struct MockRuleStorage {
    blocks: Arc<RwLock<HashMap<FilterId, Vec<String>>>>,
}

#[async_trait]
impl RuleStorage for MockRuleStorage {
    async fn read(&self, filter_id: FilterId) -> Result<Option<Vec<String>>, DomainError> {
        Ok(self.blocks.read().await.get(&filter_id).cloned())
    }

    async fn write(&self, filter_id: FilterId, rules: &[String]) -> Result<(), DomainError> {
        self.blocks.write().await.insert(filter_id, rules.to_vec());
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MockFilterStateRepository {
    versions: Arc<RwLock<HashMap<FilterId, FilterVersionInfo>>>,
    states: Arc<RwLock<HashMap<FilterId, FilterStateSnapshot>>>,
    group_states: Arc<RwLock<HashMap<GroupId, bool>>>,
}

impl MockFilterStateRepository {
    pub async fn seed_state(&self, filter_id: FilterId, enabled: bool, installed: bool) {
        self.states.write().await.insert(
            filter_id,
            FilterStateSnapshot {
                state: FilterState {
                    enabled,
                    installed,
                    loaded: installed,
                },
                lifecycle: FilterLifecycle::Active,
            },
        );
    }

    pub async fn seed_version(&self, filter_id: FilterId, version: FilterVersionInfo) {
        self.versions.write().await.insert(filter_id, version);
    }
}

#[async_trait]
impl FilterStateRepository for MockFilterStateRepository {
    async fn load_versions(&self) -> Result<HashMap<FilterId, FilterVersionInfo>, DomainError> {
        Ok(self.versions.read().await.clone())
    }

    async fn load_states(&self) -> Result<HashMap<FilterId, FilterStateSnapshot>, DomainError> {
        Ok(self.states.read().await.clone())
    }

    async fn load_group_states(&self) -> Result<HashMap<GroupId, bool>, DomainError> {
        Ok(self.group_states.read().await.clone())
    }

    async fn save_version(
        &self,
        filter_id: FilterId,
        version: &FilterVersionInfo,
    ) -> Result<(), DomainError> {
        self.versions
            .write()
            .await
            .insert(filter_id, version.clone());
        Ok(())
    }

    async fn save_state(
        &self,
        filter_id: FilterId,
        snapshot: FilterStateSnapshot,
    ) -> Result<(), DomainError> {
        self.states.write().await.insert(filter_id, snapshot);
        Ok(())
    }

    async fn save_group_state(&self, group_id: GroupId, enabled: bool) -> Result<(), DomainError> {
        self.group_states.write().await.insert(group_id, enabled);
        Ok(())
    }

    async fn load_custom_filters(&self) -> Result<Vec<Filter>, DomainError> {
        Ok(Vec::new())
    }

    async fn save_custom_filter(&self, _filter: &Filter) -> Result<(), DomainError> {
        Ok(())
    }
}

#[derive(Clone)]
pub struct MockSettingsStore {
    values: Arc<RwLock<HashMap<String, serde_json::Value>>>,
    changes: broadcast::Sender<SettingChange>,
}

impl MockSettingsStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            values: Arc::new(RwLock::new(HashMap::new())),
            changes,
        }
    }

    /// Stores a value without notifying subscribers.
    pub async fn seed(&self, name: &str, value: serde_json::Value) {
        self.values.write().await.insert(name.to_string(), value);
    }
}

#[async_trait]
impl SettingsStore for MockSettingsStore {
    async fn get_property(&self, name: &str) -> Result<Option<serde_json::Value>, DomainError> {
        Ok(self.values.read().await.get(name).cloned())
    }

    async fn set_property(&self, name: &str, value: serde_json::Value) -> Result<(), DomainError> {
        self.values.write().await.insert(name.to_string(), value);
        let _ = self.changes.send(SettingChange {
            name: Arc::from(name),
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SettingChange> {
        self.changes.subscribe()
    }
}

#[derive(Clone)]
pub struct MockFilterCatalog {
    catalog: FilterCatalog,
}

#[async_trait]
impl FilterCatalogPort for MockFilterCatalog {
    async fn load_catalog(&self) -> Result<FilterCatalog, DomainError> {
        Ok(self.catalog.clone())
    }
}

#[derive(Clone, Default)]
pub struct MockDownloadClient {
    metadata: Arc<RwLock<HashMap<FilterId, RemoteFilterMetadata>>>,
    metadata_requests: Arc<Mutex<Vec<Vec<FilterId>>>>,
    rule_requests: Arc<Mutex<Vec<(FilterId, bool)>>>,
    metadata_calls: Arc<AtomicU64>,
}

impl MockDownloadClient {
    pub async fn set_remote_version(&self, filter_id: FilterId, version: &str) {
        self.metadata.write().await.insert(
            filter_id,
            RemoteFilterMetadata {
                filter_id,
                version: Arc::from(version),
                time_updated: None,
            },
        );
    }

    pub fn metadata_calls(&self) -> u64 {
        self.metadata_calls.load(Ordering::Relaxed)
    }

    pub fn metadata_requests(&self) -> Vec<Vec<FilterId>> {
        self.metadata_requests.lock().unwrap().clone()
    }

    pub fn rule_requests(&self) -> Vec<(FilterId, bool)> {
        self.rule_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl FilterDownloadClient for MockDownloadClient {
    async fn fetch_filters_metadata(
        &self,
        filter_ids: &[FilterId],
    ) -> Result<Vec<RemoteFilterMetadata>, DomainError> {
        self.metadata_calls.fetch_add(1, Ordering::Relaxed);
        self.metadata_requests
            .lock()
            .unwrap()
            .push(filter_ids.to_vec());
        let metadata = self.metadata.read().await;
        Ok(filter_ids
            .iter()
            .filter_map(|id| metadata.get(id).cloned())
            .collect())
    }

    async fn fetch_filter_rules(
        &self,
        filter_id: FilterId,
        use_optimized: bool,
    ) -> Result<Vec<String>, DomainError> {
        self.rule_requests
            .lock()
            .unwrap()
            .push((filter_id, use_optimized));
        Ok(vec![format!("||filter{}.example^", filter_id)])
    }

    async fn fetch_rules_by_url(&self, url: &str) -> Result<Vec<String>, DomainError> {
        Err(DomainError::FilterDownloadError(format!("No rules at {}", url)))
    }
}

fn builtin(id: FilterId) -> Filter {
    let metadata = FilterMetadata {
        name: Arc::from(format!("Filter {}", id)),
        display_number: id as i32,
        ..FilterMetadata::default()
    };
    Filter::built_in(id, 1, metadata, "1.0.0.0")
}

/// Engine over an enabled group 1 holding built-in filters 1 and 2.
pub struct TestEngine {
    pub state_repo: MockFilterStateRepository,
    pub settings_store: MockSettingsStore,
    pub downloader: MockDownloadClient,
    storage: MockRuleStorage,
}

impl TestEngine {
    pub fn new() -> Self {
        Self {
            state_repo: MockFilterStateRepository::default(),
            settings_store: MockSettingsStore::new(),
            downloader: MockDownloadClient::default(),
            storage: MockRuleStorage::default(),
        }
    }

    pub async fn start(&self) -> FilterEngine {
        let mut group = FilterGroup::new(1, Arc::from("Ad Blocking"), 1);
        group.enabled = Some(true);
        let ports = EnginePorts {
            catalog: Arc::new(MockFilterCatalog {
                catalog: FilterCatalog {
                    groups: vec![group],
                    filters: vec![builtin(1), builtin(2)],
                },
            }),
            state_repo: Arc::new(self.state_repo.clone()),
            storage: Arc::new(self.storage.clone()),
            settings_store: Arc::new(self.settings_store.clone()),
            downloader: Arc::new(self.downloader.clone()),
        };
        FilterEngine::start(ports, &EngineConfig { debounce_ms: 1000 }, 48)
            .await
            .expect("engine should start")
    }
}

/// Counts update checks by recording `UpdateCheckStarted` events.
#[derive(Clone, Default)]
pub struct CheckRecorder {
    forced: Arc<Mutex<Vec<bool>>>,
}

impl CheckRecorder {
    pub fn attach(bus: &EventBus) -> Self {
        let recorder = Self::default();
        let forced = Arc::clone(&recorder.forced);
        bus.subscribe(move |event| {
            if let FilterEvent::UpdateCheckStarted { forced: f } = event {
                forced.lock().unwrap().push(*f);
            }
        });
        recorder
    }

    pub fn count(&self) -> usize {
        self.forced.lock().unwrap().len()
    }

    pub fn forced(&self) -> Vec<bool> {
        self.forced.lock().unwrap().clone()
    }
}

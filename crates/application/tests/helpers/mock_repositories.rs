#![allow(dead_code)]
#![allow(unused_imports)]

use async_trait::async_trait;
use ferrous_filters_application::ports::{
    FilterCatalogPort, FilterDownloadClient, FilterStateRepository, FilterStateSnapshot,
    RuleStorage, SettingChange, SettingsStore,
};
use ferrous_filters_domain::{
    DomainError, Filter, FilterCatalog, FilterId, FilterVersionInfo, GroupId,
    RemoteFilterMetadata,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

// ============================================================================
// Rule storage
// ============================================================================

#[derive(Clone)]
pub struct MockRuleStorage {
    blocks: Arc<RwLock<HashMap<FilterId, Vec<String>>>>,
    failing_reads: Arc<RwLock<HashSet<FilterId>>>,
    write_log: Arc<std::sync::Mutex<Vec<FilterId>>>,
    read_count: Arc<AtomicU64>,
    write_count: Arc<AtomicU64>,
    should_fail_writes: Arc<RwLock<bool>>,
}

impl MockRuleStorage {
    pub fn new() -> Self {
        Self {
            blocks: Arc::new(RwLock::new(HashMap::new())),
            failing_reads: Arc::new(RwLock::new(HashSet::new())),
            write_log: Arc::new(std::sync::Mutex::new(Vec::new())),
            read_count: Arc::new(AtomicU64::new(0)),
            write_count: Arc::new(AtomicU64::new(0)),
            should_fail_writes: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn set_rules(&self, filter_id: FilterId, rules: &[&str]) {
        self.blocks
            .write()
            .await
            .insert(filter_id, rules.iter().map(|r| r.to_string()).collect());
    }

    pub async fn rules(&self, filter_id: FilterId) -> Option<Vec<String>> {
        self.blocks.read().await.get(&filter_id).cloned()
    }

    pub async fn fail_reads_for(&self, filter_id: FilterId) {
        self.failing_reads.write().await.insert(filter_id);
    }

    pub async fn set_should_fail_writes(&self, should_fail: bool) {
        *self.should_fail_writes.write().await = should_fail;
    }

    pub fn read_count(&self) -> u64 {
        self.read_count.load(Ordering::Relaxed)
    }

    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    pub fn writes_for(&self, filter_id: FilterId) -> usize {
        self.write_log
            .lock()
            .unwrap()
            .iter()
            .filter(|id| **id == filter_id)
            .count()
    }
}

impl Default for MockRuleStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RuleStorage for MockRuleStorage {
    async fn read(&self, filter_id: FilterId) -> Result<Option<Vec<String>>, DomainError> {
        self.read_count.fetch_add(1, Ordering::Relaxed);
        if self.failing_reads.read().await.contains(&filter_id) {
            return Err(DomainError::StorageError(format!(
                "Mock read failed for {}",
                filter_id
            )));
        }
        Ok(self.blocks.read().await.get(&filter_id).cloned())
    }

    async fn write(&self, filter_id: FilterId, rules: &[String]) -> Result<(), DomainError> {
        self.write_count.fetch_add(1, Ordering::Relaxed);
        if *self.should_fail_writes.read().await {
            return Err(DomainError::StorageError("Mock write failed".to_string()));
        }
        self.write_log.lock().unwrap().push(filter_id);
        self.blocks.write().await.insert(filter_id, rules.to_vec());
        Ok(())
    }
}

// ============================================================================
// Filter state repository
// ============================================================================

#[derive(Clone)]
pub struct MockFilterStateRepository {
    versions: Arc<RwLock<HashMap<FilterId, FilterVersionInfo>>>,
    states: Arc<RwLock<HashMap<FilterId, FilterStateSnapshot>>>,
    group_states: Arc<RwLock<HashMap<GroupId, bool>>>,
    custom_filters: Arc<RwLock<HashMap<FilterId, Filter>>>,
    save_state_count: Arc<AtomicU64>,
    save_version_count: Arc<AtomicU64>,
    save_group_count: Arc<AtomicU64>,
    should_fail: Arc<RwLock<bool>>,
}

impl MockFilterStateRepository {
    pub fn new() -> Self {
        Self {
            versions: Arc::new(RwLock::new(HashMap::new())),
            states: Arc::new(RwLock::new(HashMap::new())),
            group_states: Arc::new(RwLock::new(HashMap::new())),
            custom_filters: Arc::new(RwLock::new(HashMap::new())),
            save_state_count: Arc::new(AtomicU64::new(0)),
            save_version_count: Arc::new(AtomicU64::new(0)),
            save_group_count: Arc::new(AtomicU64::new(0)),
            should_fail: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn seed_state(&self, filter_id: FilterId, snapshot: FilterStateSnapshot) {
        self.states.write().await.insert(filter_id, snapshot);
    }

    pub async fn seed_version(&self, filter_id: FilterId, version: FilterVersionInfo) {
        self.versions.write().await.insert(filter_id, version);
    }

    pub async fn seed_custom_filter(&self, filter: Filter) {
        self.custom_filters.write().await.insert(filter.id, filter);
    }

    pub async fn state(&self, filter_id: FilterId) -> Option<FilterStateSnapshot> {
        self.states.read().await.get(&filter_id).copied()
    }

    pub async fn version(&self, filter_id: FilterId) -> Option<FilterVersionInfo> {
        self.versions.read().await.get(&filter_id).cloned()
    }

    pub async fn group_state(&self, group_id: GroupId) -> Option<bool> {
        self.group_states.read().await.get(&group_id).copied()
    }

    pub async fn custom_filter(&self, filter_id: FilterId) -> Option<Filter> {
        self.custom_filters.read().await.get(&filter_id).cloned()
    }

    pub async fn set_should_fail(&self, should_fail: bool) {
        *self.should_fail.write().await = should_fail;
    }

    pub fn save_state_count(&self) -> u64 {
        self.save_state_count.load(Ordering::Relaxed)
    }

    pub fn save_version_count(&self) -> u64 {
        self.save_version_count.load(Ordering::Relaxed)
    }

    pub fn save_group_count(&self) -> u64 {
        self.save_group_count.load(Ordering::Relaxed)
    }

    async fn check_fail(&self) -> Result<(), DomainError> {
        if *self.should_fail.read().await {
            return Err(DomainError::DatabaseError("Mock database failed".to_string()));
        }
        Ok(())
    }
}

impl Default for MockFilterStateRepository {
    fn default() -> Self {
        Self::new()
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
        self.save_version_count.fetch_add(1, Ordering::Relaxed);
        self.check_fail().await?;
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
        self.save_state_count.fetch_add(1, Ordering::Relaxed);
        self.check_fail().await?;
        self.states.write().await.insert(filter_id, snapshot);
        Ok(())
    }

    async fn save_group_state(&self, group_id: GroupId, enabled: bool) -> Result<(), DomainError> {
        self.save_group_count.fetch_add(1, Ordering::Relaxed);
        self.check_fail().await?;
        self.group_states.write().await.insert(group_id, enabled);
        Ok(())
    }

    async fn load_custom_filters(&self) -> Result<Vec<Filter>, DomainError> {
        Ok(self.custom_filters.read().await.values().cloned().collect())
    }

    async fn save_custom_filter(&self, filter: &Filter) -> Result<(), DomainError> {
        self.check_fail().await?;
        self.custom_filters
            .write()
            .await
            .insert(filter.id, filter.clone());
        Ok(())
    }
}

// ============================================================================
// Settings store
// ============================================================================

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
}

impl Default for MockSettingsStore {
    fn default() -> Self {
        Self::new()
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

// ============================================================================
// Catalog
// ============================================================================

#[derive(Clone)]
pub struct MockFilterCatalog {
    catalog: Arc<RwLock<FilterCatalog>>,
    load_count: Arc<AtomicU64>,
    should_fail: Arc<RwLock<bool>>,
}

impl MockFilterCatalog {
    pub fn new(catalog: FilterCatalog) -> Self {
        Self {
            catalog: Arc::new(RwLock::new(catalog)),
            load_count: Arc::new(AtomicU64::new(0)),
            should_fail: Arc::new(RwLock::new(false)),
        }
    }

    pub fn load_count(&self) -> u64 {
        self.load_count.load(Ordering::Relaxed)
    }

    pub async fn set_should_fail(&self, should_fail: bool) {
        *self.should_fail.write().await = should_fail;
    }
}

#[async_trait]
impl FilterCatalogPort for MockFilterCatalog {
    async fn load_catalog(&self) -> Result<FilterCatalog, DomainError> {
        self.load_count.fetch_add(1, Ordering::Relaxed);
        if *self.should_fail.read().await {
            return Err(DomainError::CatalogError("Mock catalog failed".to_string()));
        }
        Ok(self.catalog.read().await.clone())
    }
}

// ============================================================================
// Download client
// ============================================================================

#[derive(Clone)]
pub struct MockDownloadClient {
    metadata: Arc<RwLock<HashMap<FilterId, RemoteFilterMetadata>>>,
    rules: Arc<RwLock<HashMap<FilterId, Vec<String>>>>,
    url_rules: Arc<RwLock<HashMap<String, Vec<String>>>>,
    failing_filters: Arc<RwLock<HashSet<FilterId>>>,
    optimized_requests: Arc<std::sync::Mutex<Vec<(FilterId, bool)>>>,
    metadata_calls: Arc<AtomicU64>,
    rules_calls: Arc<AtomicU64>,
    url_calls: Arc<AtomicU64>,
    metadata_should_fail: Arc<RwLock<bool>>,
}

impl MockDownloadClient {
    pub fn new() -> Self {
        Self {
            metadata: Arc::new(RwLock::new(HashMap::new())),
            rules: Arc::new(RwLock::new(HashMap::new())),
            url_rules: Arc::new(RwLock::new(HashMap::new())),
            failing_filters: Arc::new(RwLock::new(HashSet::new())),
            optimized_requests: Arc::new(std::sync::Mutex::new(Vec::new())),
            metadata_calls: Arc::new(AtomicU64::new(0)),
            rules_calls: Arc::new(AtomicU64::new(0)),
            url_calls: Arc::new(AtomicU64::new(0)),
            metadata_should_fail: Arc::new(RwLock::new(false)),
        }
    }

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

    pub async fn set_rules(&self, filter_id: FilterId, rules: &[&str]) {
        self.rules
            .write()
            .await
            .insert(filter_id, rules.iter().map(|r| r.to_string()).collect());
    }

    pub async fn set_url_rules(&self, url: &str, rules: &[&str]) {
        self.url_rules
            .write()
            .await
            .insert(url.to_string(), rules.iter().map(|r| r.to_string()).collect());
    }

    pub async fn fail_filter(&self, filter_id: FilterId) {
        self.failing_filters.write().await.insert(filter_id);
    }

    pub async fn set_metadata_should_fail(&self, should_fail: bool) {
        *self.metadata_should_fail.write().await = should_fail;
    }

    pub fn metadata_calls(&self) -> u64 {
        self.metadata_calls.load(Ordering::Relaxed)
    }

    pub fn rules_calls(&self) -> u64 {
        self.rules_calls.load(Ordering::Relaxed)
    }

    pub fn url_calls(&self) -> u64 {
        self.url_calls.load(Ordering::Relaxed)
    }

    pub fn rule_requests(&self) -> Vec<(FilterId, bool)> {
        self.optimized_requests.lock().unwrap().clone()
    }
}

impl Default for MockDownloadClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FilterDownloadClient for MockDownloadClient {
    async fn fetch_filters_metadata(
        &self,
        filter_ids: &[FilterId],
    ) -> Result<Vec<RemoteFilterMetadata>, DomainError> {
        self.metadata_calls.fetch_add(1, Ordering::Relaxed);
        if *self.metadata_should_fail.read().await {
            return Err(DomainError::MetadataFetchError(
                "Mock metadata endpoint failed".to_string(),
            ));
        }
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
        self.rules_calls.fetch_add(1, Ordering::Relaxed);
        self.optimized_requests
            .lock()
            .unwrap()
            .push((filter_id, use_optimized));
        if self.failing_filters.read().await.contains(&filter_id) {
            return Err(DomainError::FilterDownloadError(format!(
                "Mock download failed for {}",
                filter_id
            )));
        }
        self.rules
            .read()
            .await
            .get(&filter_id)
            .cloned()
            .ok_or_else(|| DomainError::FilterDownloadError(format!("No rules for {}", filter_id)))
    }

    async fn fetch_rules_by_url(&self, url: &str) -> Result<Vec<String>, DomainError> {
        self.url_calls.fetch_add(1, Ordering::Relaxed);
        self.url_rules
            .read()
            .await
            .get(url)
            .cloned()
            .ok_or_else(|| DomainError::FilterDownloadError(format!("No rules at {}", url)))
    }
}

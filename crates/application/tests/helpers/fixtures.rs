#![allow(dead_code)]

use super::mock_repositories::{
    MockDownloadClient, MockFilterCatalog, MockFilterStateRepository, MockRuleStorage,
    MockSettingsStore,
};
use ferrous_filters_application::events::{EventBus, EventKind, FilterEvent};
use ferrous_filters_application::ports::FilterStateSnapshot;
use ferrous_filters_application::{EnginePorts, FilterEngine};
use ferrous_filters_domain::config::EngineConfig;
use ferrous_filters_domain::{
    Filter, FilterCatalog, FilterGroup, FilterId, FilterLifecycle, FilterMetadata, FilterState,
    GroupId,
};
use std::sync::{Arc, Mutex};

pub const DEBOUNCE_MS: u64 = 1000;

pub fn builtin(id: FilterId, group_id: GroupId, version: &str) -> Filter {
    let metadata = FilterMetadata {
        name: Arc::from(format!("Filter {}", id)),
        display_number: id as i32,
        ..FilterMetadata::default()
    };
    Filter::built_in(id, group_id, metadata, version)
}

pub fn group(group_id: GroupId, enabled: Option<bool>) -> FilterGroup {
    let mut group = FilterGroup::new(group_id, Arc::from(format!("Group {}", group_id)), 1);
    group.enabled = enabled;
    group
}

pub fn snapshot(enabled: bool, installed: bool) -> FilterStateSnapshot {
    FilterStateSnapshot {
        state: FilterState {
            enabled,
            installed,
            loaded: installed,
        },
        lifecycle: FilterLifecycle::Active,
    }
}

/// Group 1 (already enabled) holding built-in filters 1, 2 and 3.
pub fn standard_catalog() -> FilterCatalog {
    FilterCatalog {
        groups: vec![group(1, Some(true))],
        filters: vec![
            builtin(1, 1, "1.0.0.0"),
            builtin(2, 1, "1.0.0.0"),
            builtin(3, 1, "1.0.0.0"),
        ],
    }
}

pub struct TestHarness {
    pub storage: MockRuleStorage,
    pub state_repo: MockFilterStateRepository,
    pub settings_store: MockSettingsStore,
    pub catalog: MockFilterCatalog,
    pub downloader: MockDownloadClient,
}

impl TestHarness {
    pub fn new(catalog: FilterCatalog) -> Self {
        Self {
            storage: MockRuleStorage::new(),
            state_repo: MockFilterStateRepository::new(),
            settings_store: MockSettingsStore::new(),
            catalog: MockFilterCatalog::new(catalog),
            downloader: MockDownloadClient::new(),
        }
    }

    pub fn ports(&self) -> EnginePorts {
        EnginePorts {
            catalog: Arc::new(self.catalog.clone()),
            state_repo: Arc::new(self.state_repo.clone()),
            storage: Arc::new(self.storage.clone()),
            settings_store: Arc::new(self.settings_store.clone()),
            downloader: Arc::new(self.downloader.clone()),
        }
    }

    /// Installed filter with the given rule text already persisted.
    pub async fn seed_filter(&self, filter_id: FilterId, enabled: bool, rules: &[&str]) {
        self.state_repo
            .seed_state(filter_id, snapshot(enabled, true))
            .await;
        self.storage.set_rules(filter_id, rules).await;
    }

    pub async fn start(&self) -> FilterEngine {
        let config = EngineConfig {
            debounce_ms: DEBOUNCE_MS,
        };
        FilterEngine::start(self.ports(), &config, 48)
            .await
            .expect("engine should start")
    }
}

/// Records every event published on a bus.
#[derive(Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<FilterEvent>>>,
}

impl EventRecorder {
    pub fn attach(bus: &EventBus) -> Self {
        let recorder = Self::default();
        let events = Arc::clone(&recorder.events);
        bus.subscribe(move |event| events.lock().unwrap().push(event.clone()));
        recorder
    }

    pub fn events(&self) -> Vec<FilterEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().iter().map(FilterEvent::kind).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.kinds().into_iter().filter(|k| *k == kind).count()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

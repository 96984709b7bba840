use async_trait::async_trait;
use ferrous_filters_domain::{
    DomainError, Filter, FilterId, FilterLifecycle, FilterState, FilterVersionInfo, GroupId,
};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterStateSnapshot {
    pub state: FilterState,
    pub lifecycle: FilterLifecycle,
}

/// Version and state snapshots, stored apart from rule text so either can
/// change without rewriting the other.
#[async_trait]
pub trait FilterStateRepository: Send + Sync {
    async fn load_versions(&self) -> Result<HashMap<FilterId, FilterVersionInfo>, DomainError>;

    async fn load_states(&self) -> Result<HashMap<FilterId, FilterStateSnapshot>, DomainError>;

    async fn load_group_states(&self) -> Result<HashMap<GroupId, bool>, DomainError>;

    async fn save_version(
        &self,
        filter_id: FilterId,
        version: &FilterVersionInfo,
    ) -> Result<(), DomainError>;

    async fn save_state(
        &self,
        filter_id: FilterId,
        snapshot: FilterStateSnapshot,
    ) -> Result<(), DomainError>;

    async fn save_group_state(&self, group_id: GroupId, enabled: bool) -> Result<(), DomainError>;

    async fn load_custom_filters(&self) -> Result<Vec<Filter>, DomainError>;

    async fn save_custom_filter(&self, filter: &Filter) -> Result<(), DomainError>;
}

use async_trait::async_trait;
use ferrous_filters_domain::DomainError;
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingChange {
    pub name: Arc<str>,
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_property(&self, name: &str) -> Result<Option<serde_json::Value>, DomainError>;

    /// Stores the value and broadcasts a [`SettingChange`].
    async fn set_property(&self, name: &str, value: serde_json::Value) -> Result<(), DomainError>;

    fn subscribe(&self) -> broadcast::Receiver<SettingChange>;
}

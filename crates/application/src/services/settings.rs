use crate::ports::{SettingChange, SettingsStore};
use ferrous_filters_domain::DomainError;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::warn;

pub const USE_OPTIMIZED_FILTERS: &str = "use-optimized-filters";
pub const UPDATE_FILTERS_PERIOD: &str = "update-filters-period";

/// Typed access to the properties the filter engine reads.
pub struct FilterSettings {
    store: Arc<dyn SettingsStore>,
    default_period_hours: i64,
}

impl FilterSettings {
    pub fn new(store: Arc<dyn SettingsStore>, default_period_hours: i64) -> Self {
        Self {
            store,
            default_period_hours,
        }
    }

    pub async fn use_optimized_filters(&self) -> bool {
        match self.store.get_property(USE_OPTIMIZED_FILTERS).await {
            Ok(Some(Value::Bool(value))) => value,
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, setting = USE_OPTIMIZED_FILTERS, "Failed to read setting");
                true
            }
        }
    }

    pub async fn set_use_optimized_filters(&self, value: bool) -> Result<(), DomainError> {
        self.store
            .set_property(USE_OPTIMIZED_FILTERS, Value::Bool(value))
            .await
    }

    /// Hours between periodic checks; zero or less disables them.
    pub async fn update_period_hours(&self) -> i64 {
        match self.store.get_property(UPDATE_FILTERS_PERIOD).await {
            Ok(Some(value)) => value.as_i64().unwrap_or(self.default_period_hours),
            Ok(None) => self.default_period_hours,
            Err(e) => {
                warn!(error = %e, setting = UPDATE_FILTERS_PERIOD, "Failed to read setting");
                self.default_period_hours
            }
        }
    }

    pub async fn set_update_period_hours(&self, hours: i64) -> Result<(), DomainError> {
        self.store
            .set_property(UPDATE_FILTERS_PERIOD, Value::from(hours))
            .await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SettingChange> {
        self.store.subscribe()
    }
}

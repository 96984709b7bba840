use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdatesConfig {
    /// Delay before the first update check after startup (seconds)
    #[serde(default = "default_first_check_delay_secs")]
    pub first_check_delay_secs: u64,

    /// Update period used until the user changes it; 0 disables periodic checks
    #[serde(default = "default_period_hours")]
    pub default_period_hours: u64,

    /// Enabling a filter checked more recently than this skips the immediate check
    #[serde(default = "default_enabled_filter_skip_secs")]
    pub enabled_filter_skip_secs: u64,

    /// Base url for filters.json and filters/{filter_id}.txt
    #[serde(default = "default_filters_url")]
    pub filters_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl UpdatesConfig {
    pub fn first_check_delay(&self) -> Duration {
        Duration::from_secs(self.first_check_delay_secs)
    }

    pub fn enabled_filter_skip(&self) -> Duration {
        Duration::from_secs(self.enabled_filter_skip_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for UpdatesConfig {
    fn default() -> Self {
        Self {
            first_check_delay_secs: default_first_check_delay_secs(),
            default_period_hours: default_period_hours(),
            enabled_filter_skip_secs: default_enabled_filter_skip_secs(),
            filters_url: default_filters_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_first_check_delay_secs() -> u64 {
    300
}

fn default_period_hours() -> u64 {
    48
}

fn default_enabled_filter_skip_secs() -> u64 {
    300
}

fn default_filters_url() -> String {
    "https://filters.adtidy.org/extension/safari".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

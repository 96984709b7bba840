use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub type FilterId = i64;
pub type GroupId = i64;

/// Reserved id of the filter holding the user's own rules.
pub const USER_FILTER_ID: FilterId = 0;

/// Custom (user-subscribed) filters are allocated ids from here upwards.
pub const CUSTOM_FILTERS_START_ID: FilterId = 1000;

pub const CUSTOM_FILTERS_GROUP_ID: GroupId = 0;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterMetadata {
    pub name: Arc<str>,
    pub description: Arc<str>,
    pub homepage: Option<Arc<str>>,
    pub tags: Vec<i64>,
    pub languages: Vec<Arc<str>>,
    pub display_number: i32,
    pub expires: Option<i64>,
    pub time_updated: Option<DateTime<Utc>>,
}

/// Where the rule text of a filter comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterSource {
    BuiltIn,
    Custom { url: Arc<str>, trusted: bool },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub enabled: bool,
    pub installed: bool,
    pub loaded: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterVersionInfo {
    pub version: Arc<str>,
    pub last_check_time: Option<DateTime<Utc>>,
    pub last_update_time: Option<DateTime<Utc>>,
}

/// Custom filters are soft-deleted so a later re-subscription can revive them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterLifecycle {
    #[default]
    Active,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub id: FilterId,
    pub group_id: GroupId,
    pub metadata: FilterMetadata,
    pub source: FilterSource,
    pub state: FilterState,
    pub version: FilterVersionInfo,
    pub lifecycle: FilterLifecycle,
}

impl Filter {
    pub fn built_in(id: FilterId, group_id: GroupId, metadata: FilterMetadata, version: &str) -> Self {
        Self {
            id,
            group_id,
            metadata,
            source: FilterSource::BuiltIn,
            state: FilterState::default(),
            version: FilterVersionInfo {
                version: Arc::from(version),
                last_check_time: None,
                last_update_time: None,
            },
            lifecycle: FilterLifecycle::Active,
        }
    }

    pub fn custom(
        id: FilterId,
        metadata: FilterMetadata,
        url: &str,
        trusted: bool,
        version: &str,
    ) -> Self {
        Self {
            id,
            group_id: CUSTOM_FILTERS_GROUP_ID,
            metadata,
            source: FilterSource::Custom {
                url: Arc::from(url),
                trusted,
            },
            state: FilterState::default(),
            version: FilterVersionInfo {
                version: Arc::from(version),
                last_check_time: None,
                last_update_time: None,
            },
            lifecycle: FilterLifecycle::Active,
        }
    }

    pub fn custom_url(&self) -> Option<&str> {
        match &self.source {
            FilterSource::Custom { url, .. } => Some(url),
            FilterSource::BuiltIn => None,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self.source, FilterSource::Custom { .. })
    }

    /// Built-in filters are always trusted; custom ones only when the user said so.
    pub fn is_trusted(&self) -> bool {
        match &self.source {
            FilterSource::BuiltIn => true,
            FilterSource::Custom { trusted, .. } => *trusted,
        }
    }

    pub fn is_removed(&self) -> bool {
        self.lifecycle == FilterLifecycle::Removed
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled && !self.is_removed()
    }

    pub fn is_installed(&self) -> bool {
        self.state.installed
    }

    pub fn mark_removed(&mut self) {
        self.state.enabled = false;
        self.state.installed = false;
        self.lifecycle = FilterLifecycle::Removed;
    }

    pub fn revive(&mut self) {
        self.lifecycle = FilterLifecycle::Active;
    }

    /// A `None` period turns periodic checks off; a filter that was never
    /// checked is still due.
    pub fn is_due_for_check(
        &self,
        now: DateTime<Utc>,
        period: Option<Duration>,
        force: bool,
    ) -> bool {
        if !self.is_installed() || !self.is_enabled() {
            return false;
        }
        if force {
            return true;
        }
        match (self.version.last_check_time, period) {
            (None, _) => true,
            (Some(last), Some(period)) => now - last >= period,
            (Some(_), None) => false,
        }
    }
}

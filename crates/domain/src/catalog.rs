use crate::filter::{Filter, FilterId};
use crate::filter_group::FilterGroup;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Built-in subscription catalog: every known group and filter.
#[derive(Debug, Clone, Default)]
pub struct FilterCatalog {
    pub groups: Vec<FilterGroup>,
    pub filters: Vec<Filter>,
}

/// Version information reported by the remote metadata endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFilterMetadata {
    pub filter_id: FilterId,
    pub version: Arc<str>,
    pub time_updated: Option<DateTime<Utc>>,
}

use chrono::{DateTime, Utc};
use ferrous_filters_domain::{
    Filter, FilterCatalog, FilterGroup, FilterMetadata, RemoteFilterMetadata,
};
use serde::Deserialize;
use std::sync::Arc;

/// `filters.json` as published by the filters server and bundled locally.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiltersDocument {
    #[serde(default)]
    pub groups: Vec<GroupEntry>,
    #[serde(default)]
    pub filters: Vec<FilterEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupEntry {
    pub group_id: i64,
    pub group_name: String,
    #[serde(default)]
    pub display_number: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterEntry {
    pub filter_id: i64,
    pub group_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub time_updated: Option<String>,
    #[serde(default)]
    pub expires: Option<i64>,
    #[serde(default)]
    pub display_number: i32,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub tags: Vec<i64>,
}

impl FiltersDocument {
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn into_catalog(self) -> FilterCatalog {
        let groups = self
            .groups
            .into_iter()
            .map(|g| FilterGroup::new(g.group_id, Arc::from(g.group_name), g.display_number))
            .collect();
        let filters = self.filters.into_iter().map(FilterEntry::into_filter).collect();
        FilterCatalog { groups, filters }
    }

    pub fn remote_metadata(&self) -> impl Iterator<Item = RemoteFilterMetadata> + '_ {
        self.filters.iter().map(|f| RemoteFilterMetadata {
            filter_id: f.filter_id,
            version: Arc::from(f.version.as_str()),
            time_updated: f.time_updated.as_deref().and_then(parse_time_updated),
        })
    }
}

impl FilterEntry {
    fn into_filter(self) -> Filter {
        let mut tags = self.tags;
        if tags.is_empty() {
            tags.push(0);
        }
        let metadata = FilterMetadata {
            name: Arc::from(self.name),
            description: Arc::from(self.description),
            homepage: self.homepage.map(Arc::from),
            tags,
            languages: self.languages.into_iter().map(Arc::from).collect(),
            display_number: self.display_number,
            expires: self.expires,
            time_updated: self.time_updated.as_deref().and_then(parse_time_updated),
        };
        Filter::built_in(self.filter_id, self.group_id, metadata, &self.version)
    }
}

/// Accepts RFC 3339 and the `2019-11-14T17:30:11+0000` form used by the
/// filters server.
pub fn parse_time_updated(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

//! Ferrous Filters Domain Layer
pub mod active_rule_set;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod filter;
pub mod filter_group;
pub mod filter_header;
pub mod filter_version;
pub mod rule_trust;

pub use active_rule_set::{ActiveRule, ActiveRuleSet};
pub use catalog::{FilterCatalog, RemoteFilterMetadata};
pub use config::{CliOverrides, Config};
pub use errors::DomainError;
pub use filter::{
    Filter, FilterId, FilterLifecycle, FilterMetadata, FilterSource, FilterState,
    FilterVersionInfo, GroupId, CUSTOM_FILTERS_GROUP_ID, CUSTOM_FILTERS_START_ID, USER_FILTER_ID,
};
pub use filter_group::FilterGroup;
pub use filter_header::{parse_filter_header, FilterHeader};
pub use filter_version::FilterVersion;
pub use rule_trust::is_trusted_rule;

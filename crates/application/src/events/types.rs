use ferrous_filters_domain::{ActiveRuleSet, DomainError, Filter, FilterGroup, FilterId};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Closed set of event kinds the bus knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    RulesAdded,
    RuleRemoved,
    FilterRulesReplaced,
    FilterEnabledChanged,
    FilterAddedRemoved,
    GroupEnabledChanged,
    FilterMetadataUpdated,
    FilterDownloadStarted,
    FilterDownloadSucceeded,
    FilterDownloadFailed,
    UserRulesUpdated,
    RulesUpdated,
    ActiveSetRebuilt,
    UpdateCheckStarted,
    UpdateCheckSucceeded,
    UpdateCheckFailed,
}

impl EventKind {
    pub const ALL: [EventKind; 16] = [
        EventKind::RulesAdded,
        EventKind::RuleRemoved,
        EventKind::FilterRulesReplaced,
        EventKind::FilterEnabledChanged,
        EventKind::FilterAddedRemoved,
        EventKind::GroupEnabledChanged,
        EventKind::FilterMetadataUpdated,
        EventKind::FilterDownloadStarted,
        EventKind::FilterDownloadSucceeded,
        EventKind::FilterDownloadFailed,
        EventKind::UserRulesUpdated,
        EventKind::RulesUpdated,
        EventKind::ActiveSetRebuilt,
        EventKind::UpdateCheckStarted,
        EventKind::UpdateCheckSucceeded,
        EventKind::UpdateCheckFailed,
    ];

    /// Wire name, stable across releases.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::RulesAdded => "event.add.rules",
            EventKind::RuleRemoved => "event.remove.rule",
            EventKind::FilterRulesReplaced => "event.update.filter.rules",
            EventKind::FilterEnabledChanged => "event.filter.enable.disable",
            EventKind::FilterAddedRemoved => "event.filter.add.remove",
            EventKind::GroupEnabledChanged => "filter.group.enable.disable",
            EventKind::FilterMetadataUpdated => "event.filter.metadata.updated",
            EventKind::FilterDownloadStarted => "event.start.download.filter",
            EventKind::FilterDownloadSucceeded => "event.success.download.filter",
            EventKind::FilterDownloadFailed => "event.error.download.filter",
            EventKind::UserRulesUpdated => "event.update.user.filter.rules",
            EventKind::RulesUpdated => "event.request.filter.updated",
            EventKind::ActiveSetRebuilt => "event.active.set.rebuilt",
            EventKind::UpdateCheckStarted => "event.update.check.started",
            EventKind::UpdateCheckSucceeded => "event.update.check.succeeded",
            EventKind::UpdateCheckFailed => "event.update.check.failed",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EventKind::RulesAdded => "RulesAdded",
            EventKind::RuleRemoved => "RuleRemoved",
            EventKind::FilterRulesReplaced => "FilterRulesReplaced",
            EventKind::FilterEnabledChanged => "FilterEnabledChanged",
            EventKind::FilterAddedRemoved => "FilterAddedRemoved",
            EventKind::GroupEnabledChanged => "GroupEnabledChanged",
            EventKind::FilterMetadataUpdated => "FilterMetadataUpdated",
            EventKind::FilterDownloadStarted => "FilterDownloadStarted",
            EventKind::FilterDownloadSucceeded => "FilterDownloadSucceeded",
            EventKind::FilterDownloadFailed => "FilterDownloadFailed",
            EventKind::UserRulesUpdated => "UserRulesUpdated",
            EventKind::RulesUpdated => "RulesUpdated",
            EventKind::ActiveSetRebuilt => "ActiveSetRebuilt",
            EventKind::UpdateCheckStarted => "UpdateCheckStarted",
            EventKind::UpdateCheckSucceeded => "UpdateCheckSucceeded",
            EventKind::UpdateCheckFailed => "UpdateCheckFailed",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejects a registry in which two kinds share one wire name.
pub fn validate_event_kinds(kinds: &[EventKind]) -> Result<(), DomainError> {
    let mut seen: FxHashMap<&'static str, EventKind> = FxHashMap::default();
    for kind in kinds {
        if let Some(previous) = seen.insert(kind.as_str(), *kind) {
            if previous != *kind {
                return Err(DomainError::DuplicateEventKind {
                    kind: kind.as_str(),
                    first: previous.name(),
                    second: kind.name(),
                });
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub enum FilterEvent {
    RulesAdded {
        filter_id: FilterId,
        rules: Vec<String>,
    },
    RuleRemoved {
        filter_id: FilterId,
        rule: String,
    },
    FilterRulesReplaced {
        filter_id: FilterId,
        rules: Vec<String>,
    },
    FilterEnabledChanged {
        filter: Arc<Filter>,
    },
    FilterAddedRemoved {
        filter: Arc<Filter>,
    },
    GroupEnabledChanged {
        group: FilterGroup,
    },
    /// Version or check-time change with no rule content change.
    FilterMetadataUpdated {
        filter_id: FilterId,
    },
    FilterDownloadStarted {
        filter_id: FilterId,
    },
    FilterDownloadSucceeded {
        filter: Arc<Filter>,
    },
    FilterDownloadFailed {
        filter_id: FilterId,
        reason: String,
    },
    UserRulesUpdated,
    RulesUpdated,
    ActiveSetRebuilt {
        rule_set: Arc<ActiveRuleSet>,
    },
    UpdateCheckStarted {
        forced: bool,
    },
    UpdateCheckSucceeded {
        forced: bool,
        updated: Vec<FilterId>,
    },
    UpdateCheckFailed {
        forced: bool,
        reason: String,
    },
}

impl FilterEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            FilterEvent::RulesAdded { .. } => EventKind::RulesAdded,
            FilterEvent::RuleRemoved { .. } => EventKind::RuleRemoved,
            FilterEvent::FilterRulesReplaced { .. } => EventKind::FilterRulesReplaced,
            FilterEvent::FilterEnabledChanged { .. } => EventKind::FilterEnabledChanged,
            FilterEvent::FilterAddedRemoved { .. } => EventKind::FilterAddedRemoved,
            FilterEvent::GroupEnabledChanged { .. } => EventKind::GroupEnabledChanged,
            FilterEvent::FilterMetadataUpdated { .. } => EventKind::FilterMetadataUpdated,
            FilterEvent::FilterDownloadStarted { .. } => EventKind::FilterDownloadStarted,
            FilterEvent::FilterDownloadSucceeded { .. } => EventKind::FilterDownloadSucceeded,
            FilterEvent::FilterDownloadFailed { .. } => EventKind::FilterDownloadFailed,
            FilterEvent::UserRulesUpdated => EventKind::UserRulesUpdated,
            FilterEvent::RulesUpdated => EventKind::RulesUpdated,
            FilterEvent::ActiveSetRebuilt { .. } => EventKind::ActiveSetRebuilt,
            FilterEvent::UpdateCheckStarted { .. } => EventKind::UpdateCheckStarted,
            FilterEvent::UpdateCheckSucceeded { .. } => EventKind::UpdateCheckSucceeded,
            FilterEvent::UpdateCheckFailed { .. } => EventKind::UpdateCheckFailed,
        }
    }
}

use crate::filter::GroupId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterGroup {
    pub group_id: GroupId,
    pub name: Arc<str>,
    pub display_number: i32,
    /// `None` until the group is toggled for the first time.
    pub enabled: Option<bool>,
}

impl FilterGroup {
    pub fn new(group_id: GroupId, name: Arc<str>, display_number: i32) -> Self {
        Self {
            group_id,
            name,
            display_number,
            enabled: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn has_enabled_status(&self) -> bool {
        self.enabled.is_some()
    }
}

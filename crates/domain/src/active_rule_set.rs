use crate::filter::FilterId;
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRule {
    pub filter_id: FilterId,
    pub text: Arc<str>,
}

/// Ordered, deduplicated rules of every contributing filter, user rules last.
///
/// Built wholesale by each rebuild and shared behind an `Arc`; never patched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRuleSet {
    rules: Vec<ActiveRule>,
    built_at: DateTime<Utc>,
}

impl ActiveRuleSet {
    pub fn new(rules: Vec<ActiveRule>, built_at: DateTime<Utc>) -> Self {
        Self { rules, built_at }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Utc::now())
    }

    pub fn rules(&self) -> &[ActiveRule] {
        &self.rules
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.text.as_ref())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }
}

use ferrous_filters_domain::DomainError;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::services::FilterRegistry;

/// Edits of the user's own rules. Changes are batched like any other filter
/// edit, so reads reflect them after the next flush.
pub struct UserRulesUseCase {
    registry: Arc<FilterRegistry>,
}

impl UserRulesUseCase {
    pub fn new(registry: Arc<FilterRegistry>) -> Self {
        Self { registry }
    }

    #[instrument(skip(self))]
    pub fn add(&self, rules: Vec<String>) {
        let rules: Vec<String> = rules
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
        if rules.is_empty() {
            return;
        }
        debug!(rules = rules.len(), "Adding user rules");
        self.registry.add_user_rules(rules);
    }

    #[instrument(skip(self))]
    pub fn remove(&self, rule: &str) {
        self.registry.remove_user_rule(rule.trim().to_string());
    }

    #[instrument(skip(self, rules))]
    pub fn replace(&self, rules: Vec<String>) {
        self.registry.set_user_rules(rules);
    }

    pub async fn get(&self) -> Result<Vec<String>, DomainError> {
        self.registry.get_user_rules().await
    }
}

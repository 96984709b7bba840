use std::sync::Arc;

use crate::services::RuleAggregator;

pub struct GetActiveRuleCountUseCase {
    aggregator: Arc<RuleAggregator>,
}

impl GetActiveRuleCountUseCase {
    pub fn new(aggregator: Arc<RuleAggregator>) -> Self {
        Self { aggregator }
    }

    pub fn execute(&self) -> usize {
        self.aggregator.rule_count()
    }
}

use crate::events::{EventBus, FilterEvent};
use crate::ports::RuleStorage;
use crate::services::filter_registry::FilterRegistry;
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use ferrous_filters_domain::{
    is_trusted_rule, ActiveRule, ActiveRuleSet, DomainError, FilterId, USER_FILTER_ID,
};
use futures::future::join_all;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Rule text of one filter as read for a rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleBlock {
    pub filter_id: FilterId,
    pub trusted: bool,
    pub rules: Vec<String>,
}

/// Builds the active set from rule blocks in the order given, moving the user
/// block last. The first occurrence of a byte-identical line wins.
pub fn build_active_rule_set(blocks: Vec<RuleBlock>, built_at: DateTime<Utc>) -> ActiveRuleSet {
    let (user_blocks, mut ordered): (Vec<RuleBlock>, Vec<RuleBlock>) = blocks
        .into_iter()
        .partition(|b| b.filter_id == USER_FILTER_ID);
    ordered.extend(user_blocks);

    let capacity = ordered.iter().map(|b| b.rules.len()).sum();
    let mut seen: FxHashSet<Arc<str>> = FxHashSet::default();
    seen.reserve(capacity);
    let mut rules = Vec::with_capacity(capacity);

    for block in ordered {
        let check_trust = !block.trusted && block.filter_id != USER_FILTER_ID;
        for line in block.rules {
            let line = line.as_str();
            if line.trim().is_empty() {
                continue;
            }
            if check_trust && !is_trusted_rule(line) {
                continue;
            }
            if seen.contains(line) {
                continue;
            }
            let text: Arc<str> = Arc::from(line);
            seen.insert(Arc::clone(&text));
            rules.push(ActiveRule {
                filter_id: block.filter_id,
                text,
            });
        }
    }

    ActiveRuleSet::new(rules, built_at)
}

/// Owns the active rule set. Rebuilds always re-read persisted rule text;
/// nothing is cached between rebuilds.
pub struct RuleAggregator {
    registry: Arc<FilterRegistry>,
    storage: Arc<dyn RuleStorage>,
    bus: Arc<EventBus>,
    current: ArcSwap<ActiveRuleSet>,
    rebuild_lock: Mutex<()>,
}

impl RuleAggregator {
    pub fn new(
        registry: Arc<FilterRegistry>,
        storage: Arc<dyn RuleStorage>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            registry,
            storage,
            bus,
            current: ArcSwap::from_pointee(ActiveRuleSet::empty()),
            rebuild_lock: Mutex::new(()),
        }
    }

    pub fn current(&self) -> Arc<ActiveRuleSet> {
        self.current.load_full()
    }

    pub fn rule_count(&self) -> usize {
        self.current.load().len()
    }

    pub async fn rebuild(&self) -> Result<Arc<ActiveRuleSet>, DomainError> {
        let _guard = self.rebuild_lock.lock().await;
        let start = Instant::now();

        let mut contributing = self.registry.contributing_filters().await?;
        contributing.push((USER_FILTER_ID, true));

        let reads = contributing
            .iter()
            .map(|(filter_id, _)| self.read_block(*filter_id));
        let contents = join_all(reads).await;

        let blocks: Vec<RuleBlock> = contributing
            .into_iter()
            .zip(contents)
            .map(|((filter_id, trusted), rules)| RuleBlock {
                filter_id,
                trusted,
                rules,
            })
            .collect();
        let filters = blocks.len() - 1;

        let rule_set = Arc::new(build_active_rule_set(blocks, Utc::now()));
        self.current.store(Arc::clone(&rule_set));

        info!(
            filters,
            rules = rule_set.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Active rule set rebuilt"
        );

        self.bus.publish(FilterEvent::ActiveSetRebuilt {
            rule_set: Arc::clone(&rule_set),
        });
        Ok(rule_set)
    }

    // A block that is missing or unreadable contributes nothing.
    async fn read_block(&self, filter_id: FilterId) -> Vec<String> {
        match self.storage.read(filter_id).await {
            Ok(Some(rules)) => rules,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(filter_id, error = %e, "Failed to read filter rules, skipping");
                Vec::new()
            }
        }
    }
}

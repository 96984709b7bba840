pub mod change_batcher;
pub mod filter_registry;
pub mod filter_update;
pub mod rule_aggregator;
pub mod settings;

pub use change_batcher::{replay_rule_changes, ChangeBatcher, PendingChange};
pub use filter_registry::FilterRegistry;
pub use filter_update::{FilterUpdateService, UpdateCheckOutcome, UpdateCheckState};
pub use rule_aggregator::{build_active_rule_set, RuleAggregator, RuleBlock};
pub use settings::{FilterSettings, UPDATE_FILTERS_PERIOD, USE_OPTIMIZED_FILTERS};

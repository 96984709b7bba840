pub mod file_rule_storage;

pub use file_rule_storage::FileRuleStorage;

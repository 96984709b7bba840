pub mod add_custom_filter;
pub mod force_update_check;
pub mod get_active_rule_count;
pub mod get_filters;
pub mod remove_custom_filter;
pub mod set_filters_enabled;
pub mod set_group_enabled;
pub mod user_rules;

pub use add_custom_filter::AddCustomFilterUseCase;
pub use force_update_check::ForceUpdateCheckUseCase;
pub use get_active_rule_count::GetActiveRuleCountUseCase;
pub use get_filters::GetFiltersUseCase;
pub use remove_custom_filter::RemoveCustomFilterUseCase;
pub use set_filters_enabled::SetFiltersEnabledUseCase;
pub use set_group_enabled::SetGroupEnabledUseCase;
pub use user_rules::UserRulesUseCase;

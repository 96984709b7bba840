use ferrous_filters_application::use_cases::{
    AddCustomFilterUseCase, ForceUpdateCheckUseCase, GetActiveRuleCountUseCase,
    GetFiltersUseCase, RemoveCustomFilterUseCase, SetFiltersEnabledUseCase,
    SetGroupEnabledUseCase, UserRulesUseCase,
};
use ferrous_filters_application::FilterEngine;
use std::sync::Arc;

pub struct UseCases {
    pub get_filters: Arc<GetFiltersUseCase>,
    pub set_filters_enabled: Arc<SetFiltersEnabledUseCase>,
    pub set_group_enabled: Arc<SetGroupEnabledUseCase>,
    pub add_custom_filter: Arc<AddCustomFilterUseCase>,
    pub remove_custom_filter: Arc<RemoveCustomFilterUseCase>,
    pub user_rules: Arc<UserRulesUseCase>,
    pub get_active_rule_count: Arc<GetActiveRuleCountUseCase>,
    pub force_update_check: Arc<ForceUpdateCheckUseCase>,
}

impl UseCases {
    pub fn new(engine: &FilterEngine) -> Self {
        Self {
            get_filters: Arc::new(GetFiltersUseCase::new(engine.registry.clone())),
            set_filters_enabled: Arc::new(SetFiltersEnabledUseCase::new(engine.registry.clone())),
            set_group_enabled: Arc::new(SetGroupEnabledUseCase::new(engine.registry.clone())),
            add_custom_filter: Arc::new(AddCustomFilterUseCase::new(engine.registry.clone())),
            remove_custom_filter: Arc::new(RemoveCustomFilterUseCase::new(
                engine.registry.clone(),
            )),
            user_rules: Arc::new(UserRulesUseCase::new(engine.registry.clone())),
            get_active_rule_count: Arc::new(GetActiveRuleCountUseCase::new(
                engine.aggregator.clone(),
            )),
            force_update_check: Arc::new(ForceUpdateCheckUseCase::new(engine.updates.clone())),
        }
    }
}

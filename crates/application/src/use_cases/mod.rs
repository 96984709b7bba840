pub mod filters;

pub use filters::{
    AddCustomFilterUseCase, ForceUpdateCheckUseCase, GetActiveRuleCountUseCase,
    GetFiltersUseCase, RemoveCustomFilterUseCase, SetFiltersEnabledUseCase,
    SetGroupEnabledUseCase, UserRulesUseCase,
};

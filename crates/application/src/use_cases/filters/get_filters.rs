use ferrous_filters_domain::{DomainError, Filter, FilterGroup};
use std::sync::Arc;

use crate::services::FilterRegistry;

pub struct GetFiltersUseCase {
    registry: Arc<FilterRegistry>,
}

impl GetFiltersUseCase {
    pub fn new(registry: Arc<FilterRegistry>) -> Self {
        Self { registry }
    }

    pub async fn execute(&self) -> Result<Vec<Filter>, DomainError> {
        self.registry.get_all_filters().await
    }

    pub async fn groups(&self) -> Result<Vec<FilterGroup>, DomainError> {
        self.registry.get_groups().await
    }
}

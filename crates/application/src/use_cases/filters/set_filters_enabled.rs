use ferrous_filters_domain::{DomainError, FilterId};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::services::FilterRegistry;

pub struct SetFiltersEnabledUseCase {
    registry: Arc<FilterRegistry>,
}

impl SetFiltersEnabledUseCase {
    pub fn new(registry: Arc<FilterRegistry>) -> Self {
        Self { registry }
    }

    #[instrument(skip(self))]
    pub async fn execute(&self, filter_ids: &[FilterId], enabled: bool) -> Result<(), DomainError> {
        self.registry.set_enabled(filter_ids, enabled).await?;

        info!(
            filters = filter_ids.len(),
            enabled = enabled,
            "Filters state updated successfully"
        );

        Ok(())
    }
}

use ferrous_filters_domain::{DomainError, FilterId};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::services::FilterRegistry;

pub struct RemoveCustomFilterUseCase {
    registry: Arc<FilterRegistry>,
}

impl RemoveCustomFilterUseCase {
    pub fn new(registry: Arc<FilterRegistry>) -> Self {
        Self { registry }
    }

    #[instrument(skip(self))]
    pub async fn execute(&self, filter_id: FilterId) -> Result<(), DomainError> {
        self.registry.remove_custom_filter(filter_id).await?;

        info!(filter_id = filter_id, "Custom filter removed successfully");

        Ok(())
    }
}

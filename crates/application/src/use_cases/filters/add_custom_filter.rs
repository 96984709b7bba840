use ferrous_filters_domain::{DomainError, Filter};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::services::FilterRegistry;

pub struct AddCustomFilterUseCase {
    registry: Arc<FilterRegistry>,
}

impl AddCustomFilterUseCase {
    pub fn new(registry: Arc<FilterRegistry>) -> Self {
        Self { registry }
    }

    #[instrument(skip(self))]
    pub async fn execute(
        &self,
        url: &str,
        title: Option<&str>,
        trusted: bool,
    ) -> Result<Filter, DomainError> {
        let url = url.trim();
        let filter = self.registry.add_custom_filter(url, title, trusted).await?;

        info!(
            filter_id = filter.id,
            name = %filter.metadata.name,
            trusted = trusted,
            "Custom filter subscribed successfully"
        );

        Ok(filter)
    }
}

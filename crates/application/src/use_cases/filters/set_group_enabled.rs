use ferrous_filters_domain::{DomainError, GroupId};
use std::sync::Arc;
use tracing::instrument;

use crate::services::FilterRegistry;

pub struct SetGroupEnabledUseCase {
    registry: Arc<FilterRegistry>,
}

impl SetGroupEnabledUseCase {
    pub fn new(registry: Arc<FilterRegistry>) -> Self {
        Self { registry }
    }

    #[instrument(skip(self))]
    pub async fn execute(&self, group_id: GroupId, enabled: bool) -> Result<(), DomainError> {
        self.registry.set_group_enabled(group_id, enabled).await
    }
}

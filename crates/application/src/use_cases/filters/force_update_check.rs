use ferrous_filters_domain::DomainError;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::services::{FilterUpdateService, UpdateCheckOutcome};

pub struct ForceUpdateCheckUseCase {
    updates: Arc<FilterUpdateService>,
}

impl ForceUpdateCheckUseCase {
    pub fn new(updates: Arc<FilterUpdateService>) -> Self {
        Self { updates }
    }

    #[instrument(skip(self))]
    pub async fn execute(&self) -> Result<UpdateCheckOutcome, DomainError> {
        let outcome = self.updates.check_for_updates(true).await?;

        info!(
            checked = outcome.checked.len(),
            updated = outcome.updated.len(),
            failed = outcome.failed.len(),
            "Forced update check completed"
        );

        Ok(outcome)
    }
}

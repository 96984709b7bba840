use async_trait::async_trait;
use ferrous_filters_application::ports::FilterCatalogPort;
use ferrous_filters_domain::{DomainError, FilterCatalog};
use std::path::PathBuf;
use tracing::{error, info, instrument};

use super::document::FiltersDocument;

/// Subscription catalog read from a local `filters.json`.
pub struct JsonFilterCatalog {
    path: PathBuf,
}

impl JsonFilterCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FilterCatalogPort for JsonFilterCatalog {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load_catalog(&self) -> Result<FilterCatalog, DomainError> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            error!(error = %e, "Failed to read filter catalog");
            DomainError::CatalogError(format!("{}: {}", self.path.display(), e))
        })?;

        let document = FiltersDocument::parse(&contents).map_err(|e| {
            error!(error = %e, "Failed to parse filter catalog");
            DomainError::CatalogError(format!("{}: {}", self.path.display(), e))
        })?;

        let catalog = document.into_catalog();
        info!(
            groups = catalog.groups.len(),
            filters = catalog.filters.len(),
            "Filter catalog loaded"
        );
        Ok(catalog)
    }
}

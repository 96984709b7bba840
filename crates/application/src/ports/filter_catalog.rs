use async_trait::async_trait;
use ferrous_filters_domain::{DomainError, FilterCatalog};

#[async_trait]
pub trait FilterCatalogPort: Send + Sync {
    async fn load_catalog(&self) -> Result<FilterCatalog, DomainError>;
}

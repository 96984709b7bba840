use async_trait::async_trait;
use ferrous_filters_domain::{DomainError, FilterId, RemoteFilterMetadata};

#[async_trait]
pub trait FilterDownloadClient: Send + Sync {
    /// Current remote versions for the given built-in filters.
    async fn fetch_filters_metadata(
        &self,
        filter_ids: &[FilterId],
    ) -> Result<Vec<RemoteFilterMetadata>, DomainError>;

    async fn fetch_filter_rules(
        &self,
        filter_id: FilterId,
        use_optimized: bool,
    ) -> Result<Vec<String>, DomainError>;

    async fn fetch_rules_by_url(&self, url: &str) -> Result<Vec<String>, DomainError>;
}

use async_trait::async_trait;
use ferrous_filters_domain::{DomainError, FilterId};

/// Persisted rule text, one block of lines per filter id.
#[async_trait]
pub trait RuleStorage: Send + Sync {
    /// `Ok(None)` when nothing was ever written for the filter.
    async fn read(&self, filter_id: FilterId) -> Result<Option<Vec<String>>, DomainError>;

    /// Replaces the whole block; readers never observe a partial write.
    async fn write(&self, filter_id: FilterId, rules: &[String]) -> Result<(), DomainError>;
}

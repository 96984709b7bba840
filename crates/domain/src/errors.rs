use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Filter not found: {0}")]
    FilterNotFound(i64),

    #[error("Filter {0} is not a custom filter")]
    NotCustomFilter(i64),

    #[error("Group not found: {0}")]
    GroupNotFound(i64),

    #[error("Invalid filter url: {0}")]
    InvalidFilterUrl(String),

    #[error("Failed to install filter {filter_id}: {reason}")]
    FilterInstallFailed { filter_id: i64, reason: String },

    #[error("Filter download error: {0}")]
    FilterDownloadError(String),

    #[error("Filter metadata fetch error: {0}")]
    MetadataFetchError(String),

    #[error("Filter catalog error: {0}")]
    CatalogError(String),

    #[error("Rule storage error: {0}")]
    StorageError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Duplicate event kind '{kind}' registered for {first} and {second}")]
    DuplicateEventKind {
        kind: &'static str,
        first: &'static str,
        second: &'static str,
    },

    #[error("Change batcher is not running")]
    BatcherStopped,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

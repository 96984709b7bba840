pub mod engine;
pub mod errors;
pub mod logging;
pub mod root;
pub mod storage;
pub mod updates;

pub use engine::EngineConfig;
pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use root::{CliOverrides, Config};
pub use storage::StorageConfig;
pub use updates::UpdatesConfig;

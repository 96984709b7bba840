mod filter_catalog;
mod filter_download_client;
mod filter_state_repository;
mod rule_storage;
mod settings_store;

pub use filter_catalog::FilterCatalogPort;
pub use filter_download_client::FilterDownloadClient;
pub use filter_state_repository::{FilterStateRepository, FilterStateSnapshot};
pub use rule_storage::RuleStorage;
pub use settings_store::{SettingChange, SettingsStore};

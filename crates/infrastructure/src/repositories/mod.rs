pub mod filter_state_repository;
pub mod settings_repository;

pub use filter_state_repository::SqliteFilterStateRepository;
pub use settings_repository::SqliteSettingsStore;

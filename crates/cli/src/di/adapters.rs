use ferrous_filters_application::EnginePorts;
use ferrous_filters_domain::{Config, DomainError};
use ferrous_filters_infrastructure::catalog::JsonFilterCatalog;
use ferrous_filters_infrastructure::http::HttpFilterDownloadClient;
use ferrous_filters_infrastructure::repositories::{
    SqliteFilterStateRepository, SqliteSettingsStore,
};
use ferrous_filters_infrastructure::storage::FileRuleStorage;
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct Adapters {
    pub catalog: Arc<JsonFilterCatalog>,
    pub state_repo: Arc<SqliteFilterStateRepository>,
    pub storage: Arc<FileRuleStorage>,
    pub settings_store: Arc<SqliteSettingsStore>,
    pub downloader: Arc<HttpFilterDownloadClient>,
}

impl Adapters {
    pub fn new(config: &Config, pool: SqlitePool) -> Result<Self, DomainError> {
        Ok(Self {
            catalog: Arc::new(JsonFilterCatalog::new(&config.storage.catalog_path)),
            state_repo: Arc::new(SqliteFilterStateRepository::new(pool.clone())),
            storage: Arc::new(FileRuleStorage::new(&config.storage.rules_dir)),
            settings_store: Arc::new(SqliteSettingsStore::new(pool)),
            downloader: Arc::new(HttpFilterDownloadClient::new(&config.updates)?),
        })
    }

    pub fn ports(&self) -> EnginePorts {
        EnginePorts {
            catalog: self.catalog.clone(),
            state_repo: self.state_repo.clone(),
            storage: self.storage.clone(),
            settings_store: self.settings_store.clone(),
            downloader: self.downloader.clone(),
        }
    }
}

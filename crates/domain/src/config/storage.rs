use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// SQLite database holding settings and filter state
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Directory with one rule file per filter id
    #[serde(default = "default_rules_dir")]
    pub rules_dir: String,

    /// Built-in subscription catalog (filters.json)
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            rules_dir: default_rules_dir(),
            catalog_path: default_catalog_path(),
        }
    }
}

fn default_database_path() -> String {
    "ferrous-filters.db".to_string()
}

fn default_rules_dir() -> String {
    "rules".to_string()
}

fn default_catalog_path() -> String {
    "filters/filters.json".to_string()
}

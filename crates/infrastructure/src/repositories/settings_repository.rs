use async_trait::async_trait;
use ferrous_filters_application::ports::{SettingChange, SettingsStore};
use ferrous_filters_domain::DomainError;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, instrument};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Named JSON values in the `settings` table.
pub struct SqliteSettingsStore {
    pool: SqlitePool,
    changes: broadcast::Sender<SettingChange>,
}

impl SqliteSettingsStore {
    pub fn new(pool: SqlitePool) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { pool, changes }
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    #[instrument(skip(self))]
    async fn get_property(&self, name: &str) -> Result<Option<serde_json::Value>, DomainError> {
        let row = sqlx::query_as::<_, (String,)>("SELECT value FROM settings WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to read setting");
                DomainError::DatabaseError(e.to_string())
            })?;

        match row {
            Some((value,)) => serde_json::from_str(&value).map(Some).map_err(|e| {
                error!(error = %e, "Stored setting is not valid JSON");
                DomainError::DatabaseError(format!("setting '{}': {}", name, e))
            }),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, value))]
    async fn set_property(&self, name: &str, value: serde_json::Value) -> Result<(), DomainError> {
        let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

        sqlx::query(
            "INSERT INTO settings (name, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(name) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(name)
        .bind(value.to_string())
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to write setting");
            DomainError::DatabaseError(e.to_string())
        })?;

        // No receivers is not an error.
        let receivers = self
            .changes
            .send(SettingChange {
                name: Arc::from(name),
            })
            .unwrap_or(0);
        debug!(receivers, "Setting changed");
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SettingChange> {
        self.changes.subscribe()
    }
}

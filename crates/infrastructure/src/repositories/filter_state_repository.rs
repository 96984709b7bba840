use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ferrous_filters_application::ports::{FilterStateRepository, FilterStateSnapshot};
use ferrous_filters_domain::{
    DomainError, Filter, FilterId, FilterLifecycle, FilterMetadata, FilterSource, FilterState,
    FilterVersionInfo, GroupId,
};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, instrument};

type VersionRow = (i64, String, Option<String>, Option<String>);

type StateRow = (i64, i64, i64, i64, i64);

type CustomFilterRow = (
    i64,
    String,
    i64,
    String,
    String,
    Option<String>,
    String,
    Option<i64>,
    Option<String>,
);

pub struct SqliteFilterStateRepository {
    pool: SqlitePool,
}

impl SqliteFilterStateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_version(row: VersionRow) -> (FilterId, FilterVersionInfo) {
        let (filter_id, version, last_check_time, last_update_time) = row;
        (
            filter_id,
            FilterVersionInfo {
                version: Arc::from(version.as_str()),
                last_check_time: last_check_time.as_deref().and_then(parse_timestamp),
                last_update_time: last_update_time.as_deref().and_then(parse_timestamp),
            },
        )
    }

    fn row_to_state(row: StateRow) -> (FilterId, FilterStateSnapshot) {
        let (filter_id, enabled, installed, loaded, removed) = row;
        (
            filter_id,
            FilterStateSnapshot {
                state: FilterState {
                    enabled: enabled != 0,
                    installed: installed != 0,
                    loaded: loaded != 0,
                },
                lifecycle: if removed != 0 {
                    FilterLifecycle::Removed
                } else {
                    FilterLifecycle::Active
                },
            },
        )
    }

    fn row_to_custom_filter(row: CustomFilterRow) -> Filter {
        let (filter_id, url, trusted, name, description, homepage, version, expires, time_updated) =
            row;
        let metadata = FilterMetadata {
            name: Arc::from(name.as_str()),
            description: Arc::from(description.as_str()),
            homepage: homepage.map(|s| Arc::from(s.as_str())),
            tags: vec![0],
            languages: Vec::new(),
            display_number: 0,
            expires,
            time_updated: time_updated.as_deref().and_then(parse_timestamp),
        };
        Filter::custom(filter_id, metadata, &url, trusted != 0, &version)
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn format_timestamp(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(|t| t.to_rfc3339())
}

fn flag(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

#[async_trait]
impl FilterStateRepository for SqliteFilterStateRepository {
    #[instrument(skip(self))]
    async fn load_versions(&self) -> Result<HashMap<FilterId, FilterVersionInfo>, DomainError> {
        let rows = sqlx::query_as::<_, VersionRow>(
            "SELECT filter_id, version, last_check_time, last_update_time FROM filter_versions",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to load filter versions");
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(Self::row_to_version).collect())
    }

    #[instrument(skip(self))]
    async fn load_states(&self) -> Result<HashMap<FilterId, FilterStateSnapshot>, DomainError> {
        let rows = sqlx::query_as::<_, StateRow>(
            "SELECT filter_id, enabled, installed, loaded, removed FROM filter_states",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to load filter states");
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(Self::row_to_state).collect())
    }

    #[instrument(skip(self))]
    async fn load_group_states(&self) -> Result<HashMap<GroupId, bool>, DomainError> {
        let rows = sqlx::query_as::<_, (i64, i64)>("SELECT group_id, enabled FROM group_states")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to load group states");
                DomainError::DatabaseError(e.to_string())
            })?;

        Ok(rows
            .into_iter()
            .map(|(group_id, enabled)| (group_id, enabled != 0))
            .collect())
    }

    #[instrument(skip(self, version))]
    async fn save_version(
        &self,
        filter_id: FilterId,
        version: &FilterVersionInfo,
    ) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO filter_versions (filter_id, version, last_check_time, last_update_time)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(filter_id) DO UPDATE SET
                version = excluded.version,
                last_check_time = excluded.last_check_time,
                last_update_time = excluded.last_update_time",
        )
        .bind(filter_id)
        .bind(version.version.as_ref())
        .bind(format_timestamp(version.last_check_time))
        .bind(format_timestamp(version.last_update_time))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, filter_id, "Failed to save filter version");
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn save_state(
        &self,
        filter_id: FilterId,
        snapshot: FilterStateSnapshot,
    ) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO filter_states (filter_id, enabled, installed, loaded, removed)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(filter_id) DO UPDATE SET
                enabled = excluded.enabled,
                installed = excluded.installed,
                loaded = excluded.loaded,
                removed = excluded.removed",
        )
        .bind(filter_id)
        .bind(flag(snapshot.state.enabled))
        .bind(flag(snapshot.state.installed))
        .bind(flag(snapshot.state.loaded))
        .bind(flag(snapshot.lifecycle == FilterLifecycle::Removed))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, filter_id, "Failed to save filter state");
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn save_group_state(&self, group_id: GroupId, enabled: bool) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO group_states (group_id, enabled) VALUES (?, ?)
             ON CONFLICT(group_id) DO UPDATE SET enabled = excluded.enabled",
        )
        .bind(group_id)
        .bind(flag(enabled))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, group_id, "Failed to save group state");
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn load_custom_filters(&self) -> Result<Vec<Filter>, DomainError> {
        let rows = sqlx::query_as::<_, CustomFilterRow>(
            "SELECT filter_id, url, trusted, name, description, homepage, version, expires, time_updated
             FROM custom_filters ORDER BY filter_id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to load custom filters");
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(Self::row_to_custom_filter).collect())
    }

    #[instrument(skip(self, filter), fields(filter_id = filter.id))]
    async fn save_custom_filter(&self, filter: &Filter) -> Result<(), DomainError> {
        let FilterSource::Custom { url, trusted } = &filter.source else {
            return Err(DomainError::NotCustomFilter(filter.id));
        };

        sqlx::query(
            "INSERT INTO custom_filters
                (filter_id, url, trusted, name, description, homepage, version, expires, time_updated)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(filter_id) DO UPDATE SET
                url = excluded.url,
                trusted = excluded.trusted,
                name = excluded.name,
                description = excluded.description,
                homepage = excluded.homepage,
                version = excluded.version,
                expires = excluded.expires,
                time_updated = excluded.time_updated",
        )
        .bind(filter.id)
        .bind(url.as_ref())
        .bind(flag(*trusted))
        .bind(filter.metadata.name.as_ref())
        .bind(filter.metadata.description.as_ref())
        .bind(filter.metadata.homepage.as_deref())
        .bind(filter.version.version.as_ref())
        .bind(filter.metadata.expires)
        .bind(format_timestamp(filter.metadata.time_updated))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to save custom filter");
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }
}

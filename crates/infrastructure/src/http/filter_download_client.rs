use async_trait::async_trait;
use ferrous_filters_application::ports::FilterDownloadClient;
use ferrous_filters_domain::config::UpdatesConfig;
use ferrous_filters_domain::{DomainError, FilterId, RemoteFilterMetadata};
use rustc_hash::FxHashSet;
use tracing::{debug, error, instrument};

use crate::catalog::FiltersDocument;

const USER_AGENT: &str = "Ferrous-Filters/1.0 (filter-sync)";

/// Fetches metadata and rule text from the filters server. Subscription
/// urls may also point at local files through `file://`.
pub struct HttpFilterDownloadClient {
    client: reqwest::Client,
    filters_url: String,
}

impl HttpFilterDownloadClient {
    pub fn new(config: &UpdatesConfig) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| DomainError::FilterDownloadError(e.to_string()))?;

        Ok(Self {
            client,
            filters_url: config.filters_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn metadata_url(&self) -> String {
        format!("{}/filters.json", self.filters_url)
    }

    pub fn rules_url(&self, filter_id: FilterId, use_optimized: bool) -> String {
        if use_optimized {
            format!("{}/filters/{}_optimized.txt", self.filters_url, filter_id)
        } else {
            format!("{}/filters/{}.txt", self.filters_url, filter_id)
        }
    }

    async fn fetch_text(&self, url: &str) -> Result<String, String> {
        if let Some(path) = url.strip_prefix("file://") {
            return tokio::fs::read_to_string(path)
                .await
                .map_err(|e| format!("read error for {}: {}", url, e));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("request failed for {}: {}", url, e))?;

        if !response.status().is_success() {
            return Err(format!("HTTP {} for {}", response.status().as_u16(), url));
        }

        response
            .text()
            .await
            .map_err(|e| format!("read error for {}: {}", url, e))
    }
}

/// Splits downloaded text into rule lines, dropping an `[Adblock Plus 2.0]`
/// style first line.
pub fn split_rules(text: &str) -> Vec<String> {
    let mut lines = text.lines().peekable();
    if lines.peek().is_some_and(|first| first.starts_with('[')) {
        lines.next();
    }
    lines.map(str::to_string).collect()
}

#[async_trait]
impl FilterDownloadClient for HttpFilterDownloadClient {
    #[instrument(skip(self, filter_ids), fields(filters = filter_ids.len()))]
    async fn fetch_filters_metadata(
        &self,
        filter_ids: &[FilterId],
    ) -> Result<Vec<RemoteFilterMetadata>, DomainError> {
        let url = self.metadata_url();
        let text = self.fetch_text(&url).await.map_err(|e| {
            error!(error = %e, "Failed to fetch filters metadata");
            DomainError::MetadataFetchError(e)
        })?;

        let document = FiltersDocument::parse(&text).map_err(|e| {
            error!(error = %e, "Failed to parse filters metadata");
            DomainError::MetadataFetchError(format!("invalid metadata from {}: {}", url, e))
        })?;

        let wanted: FxHashSet<FilterId> = filter_ids.iter().copied().collect();
        let metadata: Vec<RemoteFilterMetadata> = document
            .remote_metadata()
            .filter(|m| wanted.contains(&m.filter_id))
            .collect();

        debug!(found = metadata.len(), "Filters metadata fetched");
        Ok(metadata)
    }

    #[instrument(skip(self))]
    async fn fetch_filter_rules(
        &self,
        filter_id: FilterId,
        use_optimized: bool,
    ) -> Result<Vec<String>, DomainError> {
        let url = self.rules_url(filter_id, use_optimized);
        let text = self.fetch_text(&url).await.map_err(|e| {
            error!(error = %e, "Failed to download filter rules");
            DomainError::FilterDownloadError(e)
        })?;

        let rules: Vec<String> = text.lines().map(str::to_string).collect();
        debug!(rules = rules.len(), "Filter rules downloaded");
        Ok(rules)
    }

    #[instrument(skip(self))]
    async fn fetch_rules_by_url(&self, url: &str) -> Result<Vec<String>, DomainError> {
        let text = self.fetch_text(url).await.map_err(|e| {
            error!(error = %e, "Failed to download custom filter");
            DomainError::FilterDownloadError(e)
        })?;

        let rules = split_rules(&text);
        debug!(rules = rules.len(), "Custom filter downloaded");
        Ok(rules)
    }
}

mod helpers;

use ferrous_filters_application::ports::{FilterCatalogPort, FilterDownloadClient};
use ferrous_filters_domain::config::UpdatesConfig;
use ferrous_filters_domain::DomainError;
use ferrous_filters_infrastructure::catalog::JsonFilterCatalog;
use ferrous_filters_infrastructure::http::HttpFilterDownloadClient;
use helpers::FILTERS_JSON;
use std::path::Path;
use tempfile::TempDir;

fn file_client(root: &Path) -> HttpFilterDownloadClient {
    let config = UpdatesConfig {
        filters_url: format!("file://{}", root.display()),
        ..UpdatesConfig::default()
    };
    HttpFilterDownloadClient::new(&config).unwrap()
}

fn write_filters_server(root: &Path) {
    std::fs::write(root.join("filters.json"), FILTERS_JSON).unwrap();
    std::fs::create_dir_all(root.join("filters")).unwrap();
    std::fs::write(root.join("filters").join("2.txt"), "! Title: Base\n||full.example^").unwrap();
    std::fs::write(
        root.join("filters").join("2_optimized.txt"),
        "! Title: Base\n||optimized.example^",
    )
    .unwrap();
}

#[tokio::test]
async fn test_json_catalog_loads_groups_and_filters() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("filters.json");
    std::fs::write(&path, FILTERS_JSON).unwrap();
    let catalog = JsonFilterCatalog::new(&path);

    // Act
    let catalog = catalog.load_catalog().await.unwrap();

    // Assert
    assert_eq!(catalog.groups.len(), 2);
    assert_eq!(catalog.filters.len(), 2);
    let base = catalog.filters.iter().find(|f| f.id == 2).unwrap();
    assert_eq!(base.group_id, 1);
    assert_eq!(base.metadata.tags, vec![1, 2]);
    assert_eq!(&*base.metadata.languages[0], "en");
    let tracking = catalog.filters.iter().find(|f| f.id == 3).unwrap();
    assert_eq!(tracking.metadata.tags, vec![0]);
    assert_eq!(tracking.metadata.homepage, None);
}

#[tokio::test]
async fn test_json_catalog_missing_file_is_catalog_error() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let catalog = JsonFilterCatalog::new(dir.path().join("absent.json"));

    // Act
    let result = catalog.load_catalog().await;

    // Assert
    assert!(matches!(result, Err(DomainError::CatalogError(_))));
}

#[tokio::test]
async fn test_json_catalog_invalid_json_is_catalog_error() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("filters.json");
    std::fs::write(&path, "{ not json").unwrap();

    // Act
    let result = JsonFilterCatalog::new(&path).load_catalog().await;

    // Assert
    assert!(matches!(result, Err(DomainError::CatalogError(_))));
}

#[tokio::test]
async fn test_metadata_is_filtered_to_requested_ids() {
    // Arrange
    let dir = TempDir::new().unwrap();
    write_filters_server(dir.path());
    let client = file_client(dir.path());

    // Act
    let metadata = client.fetch_filters_metadata(&[2, 99]).await.unwrap();

    // Assert
    assert_eq!(metadata.len(), 1);
    assert_eq!(metadata[0].filter_id, 2);
    assert_eq!(&*metadata[0].version, "2.1.54.7");
    assert!(metadata[0].time_updated.is_some());
}

#[tokio::test]
async fn test_metadata_unreachable_is_metadata_error() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let client = file_client(dir.path());

    // Act
    let result = client.fetch_filters_metadata(&[2]).await;

    // Assert
    assert!(matches!(result, Err(DomainError::MetadataFetchError(_))));
}

#[tokio::test]
async fn test_rules_follow_optimized_flag() {
    // Arrange
    let dir = TempDir::new().unwrap();
    write_filters_server(dir.path());
    let client = file_client(dir.path());

    // Act
    let full = client.fetch_filter_rules(2, false).await.unwrap();
    let optimized = client.fetch_filter_rules(2, true).await.unwrap();

    // Assert
    assert_eq!(full, vec!["! Title: Base", "||full.example^"]);
    assert_eq!(optimized, vec!["! Title: Base", "||optimized.example^"]);
}

#[tokio::test]
async fn test_missing_rules_is_download_error() {
    // Arrange
    let dir = TempDir::new().unwrap();
    write_filters_server(dir.path());
    let client = file_client(dir.path());

    // Act
    let result = client.fetch_filter_rules(404, false).await;

    // Assert
    assert!(matches!(result, Err(DomainError::FilterDownloadError(_))));
}

#[tokio::test]
async fn test_custom_rules_by_file_url_strip_adblock_header() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.txt");
    std::fs::write(&path, "[Adblock Plus 2.0]\n! Title: Mine\n||mine.example^\n").unwrap();
    let client = file_client(dir.path());

    // Act
    let rules = client
        .fetch_rules_by_url(&format!("file://{}", path.display()))
        .await
        .unwrap();

    // Assert
    assert_eq!(rules, vec!["! Title: Mine", "||mine.example^"]);
}

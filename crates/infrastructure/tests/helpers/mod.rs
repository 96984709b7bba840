#![allow(dead_code)]

use ferrous_filters_infrastructure::database::MIGRATOR;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

pub async fn create_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    MIGRATOR.run(&pool).await.unwrap();

    pool
}

pub const FILTERS_JSON: &str = r#"{
    "groups": [
        {"groupId": 1, "groupName": "Ad Blocking", "displayNumber": 1},
        {"groupId": 2, "groupName": "Privacy", "displayNumber": 2}
    ],
    "filters": [
        {
            "filterId": 2,
            "groupId": 1,
            "name": "Base filter",
            "description": "Removes ads",
            "homepage": "https://example.org/base",
            "version": "2.1.54.7",
            "timeUpdated": "2024-03-01T10:00:00+0000",
            "expires": 345600,
            "displayNumber": 1,
            "languages": ["en"],
            "tags": [1, 2]
        },
        {
            "filterId": 3,
            "groupId": 2,
            "name": "Tracking protection",
            "description": "Blocks trackers",
            "version": "1.0.0.1",
            "displayNumber": 1
        }
    ]
}"#;

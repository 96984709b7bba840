use ferrous_filters_infrastructure::database::{create_pool, database_url};
use sqlx::SqlitePool;
use tracing::{error, info};

pub async fn init_database(path: &str) -> anyhow::Result<SqlitePool> {
    let url = database_url(path);
    info!("Initializing database: {}", url);

    let pool = create_pool(&url).await.map_err(|e| {
        error!("Failed to initialize database: {}", e);
        anyhow::anyhow!(e)
    })?;

    info!("Database initialized successfully");
    Ok(pool)
}

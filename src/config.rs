use crate::schemas::AppState;
use anyhow::Result;
use moka::future::Cache;
use sea_orm::Database;
use std::time::Duration;

/// Sessions expire after two weeks without the store being restarted.
const SESSION_TTL: Duration = Duration::from_secs(14 * 24 * 60 * 60);

/// Initialize application state for the given database URL
pub async fn initialize_app_state_with_url(database_url: &str) -> Result<AppState> {
    tracing::info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;

    // Session store
    let sessions = Cache::builder()
        .max_capacity(10_000)
        .time_to_live(SESSION_TTL)
        .build();

    Ok(AppState { db, sessions })
}

use anyhow::{Context, Result};
use sqlx::MySqlPool;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    config::Config,
    store::{CrmStore, memory::MemoryStore, mysql::MySqlStore},
};

/// Connects to MySQL and applies migrations, or falls back to the
/// in-memory store when no `DATABASE_URL` is configured.
pub async fn init_store(config: &Config) -> Result<Arc<dyn CrmStore>> {
    match &config.database_url {
        Some(url) => {
            let pool = MySqlPool::connect(url)
                .await
                .context("Failed to connect to database")?;

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run migrations")?;

            info!("Using MySQL store");
            Ok(Arc::new(MySqlStore::new(pool)))
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory store (data is lost on restart)");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

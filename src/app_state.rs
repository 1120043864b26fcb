use std::path::PathBuf;

use anyhow::{Context, Result};
use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::Pool;

use crate::config::Config;

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: Pool<AsyncPgConnection>,
    pub media_root: PathBuf,
}

impl AppState {
    pub async fn init(config: &Config) -> Result<Self> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.database.url);
        let db_pool = Pool::builder()
            .build(manager)
            .await
            .context("Failed to build the DB connection pool")?;

        Ok(Self {
            db_pool,
            media_root: config.media.root.clone(),
        })
    }
}

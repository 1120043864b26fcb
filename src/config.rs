use std::path::PathBuf;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Directory uploaded product images are written to.
    pub root: PathBuf,
}

/// Loads the configuration from environment variables. `bootstrap::init_env`
/// should have populated them from `.env` beforehand.
pub fn load() -> Result<Config> {
    let url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let port = match std::env::var("PORT") {
        Ok(port) => port.parse().context("PORT must be a valid port number")?,
        Err(_) => 3000,
    };
    let root = std::env::var("MEDIA_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("media"));

    Ok(Config {
        database: DatabaseConfig { url },
        server: ServerConfig { port },
        media: MediaConfig { root },
    })
}

use anyhow::{Context, Result};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::{app_state::AppState, config};

pub fn init_tracing() {
    tracing_subscriber::fmt().init();
}

pub fn init_env() {
    // A missing .env file is fine; deployments set real environment variables.
    dotenvy::dotenv().ok();
}

/// Builds the shared state, attaches request tracing and serves the app
/// until the process is stopped.
pub async fn bootstrap(service_name: &str, app: Router<AppState>) -> Result<()> {
    let config = config::load()?;
    let state = AppState::init(&config).await?;
    let app = app.with_state(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.server.port))
        .await
        .context("Failed to bind the server port")?;
    tracing::info!(
        "{service_name} listening on {}",
        listener.local_addr().context("Failed to read local addr")?
    );

    axum::serve(listener, app)
        .await
        .context("Server terminated unexpectedly")?;
    Ok(())
}

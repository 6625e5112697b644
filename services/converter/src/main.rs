use std::sync::Arc;

use anyhow::{Context, Result};
use common::config::ConverterConfig;
use common::process::TokioProcessRunner;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod error;
mod models;
mod pipeline;
mod probe;
mod resolution;
mod routes;
mod state;
mod upload;
mod validation;
mod workflow;

#[cfg(test)]
mod testing;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting GIF converter service");

    let config = ConverterConfig::from_env()?;
    std::fs::create_dir_all(&config.work_dir).with_context(|| {
        format!("Failed to create work directory {}", config.work_dir.display())
    })?;
    let address = config.bind_address()?;

    if let Some(timeout) = config.encoder_timeout() {
        info!("Encoder invocations time out after {:?}", timeout);
    }
    let runner = Arc::new(TokioProcessRunner::new(config.encoder_timeout()));
    let app_state = AppState::new(config, runner);

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(address).await?;
    info!("GIF converter listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down GIF converter service");
        })
        .await?;

    Ok(())
}

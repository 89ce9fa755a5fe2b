//! Application setup and initialization
//!
//! Everything main.rs needs, kept out of main for testability. Integration tests build
//! [`AppState`] directly and call [`routes::setup_routes`].

pub mod database;
pub mod routes;
pub mod server;
pub mod storage;

use crate::state::AppState;
use admissions_core::Config;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry(config.is_production())
        .context("Failed to initialize telemetry")?;

    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    let stores = database::setup_database(&config).await?;
    let storage = storage::setup_storage(&config).await?;

    let state = Arc::new(AppState::new(config.clone(), stores, storage));

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}

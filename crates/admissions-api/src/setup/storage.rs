//! Storage setup and initialization

use admissions_core::Config;
use admissions_storage::{create_storage, ConfiguredStorage};
use anyhow::Result;

pub async fn setup_storage(config: &Config) -> Result<ConfiguredStorage> {
    tracing::info!("Initializing storage abstraction...");
    let configured = create_storage(config).await?;
    tracing::info!(
        backend = %configured.storage.backend_type(),
        "Storage abstraction initialized successfully"
    );
    Ok(configured)
}

//! Database repositories for data access layer
//!
//! Each store is a trait with a PostgreSQL repository and an in-memory implementation.
//! The API picks one pair at startup from `DATABASE_URL`.

pub mod application;
pub mod memory;
pub mod settings;

pub use application::{ApplicationRepository, ApplicationStore};
pub use memory::{InMemoryApplicationStore, InMemorySettingsStore};
pub use settings::{SettingsRepository, SettingsStore};

use sqlx::PgPool;
use std::sync::Arc;

/// The stores the API runs against
#[derive(Clone)]
pub struct Stores {
    pub applications: Arc<dyn ApplicationStore>,
    pub settings: Arc<dyn SettingsStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        tracing::info!("Using PostgreSQL stores");
        Self {
            applications: Arc::new(ApplicationRepository::new(pool.clone())),
            settings: Arc::new(SettingsRepository::new(pool)),
        }
    }

    /// Non-durable stores. The gate starts closed, like a fresh database.
    pub fn in_memory() -> Self {
        tracing::warn!("Using in-memory stores; data is lost on restart");
        Self {
            applications: Arc::new(InMemoryApplicationStore::new()),
            settings: Arc::new(InMemorySettingsStore::default()),
        }
    }
}

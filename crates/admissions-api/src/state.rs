//! Application state shared by all handlers.

use crate::services::UploadUrlBroker;
use admissions_core::Config;
use admissions_db::Stores;
use admissions_storage::{ConfiguredStorage, LocalStorage, Storage};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub stores: Stores,
    pub storage: Arc<dyn Storage>,
    /// Set when the local backend is active; serves `/local-objects`
    pub local_storage: Option<Arc<LocalStorage>>,
    pub broker: UploadUrlBroker,
}

impl AppState {
    pub fn new(config: Config, stores: Stores, storage: ConfiguredStorage) -> Self {
        let broker = UploadUrlBroker::new(
            storage.storage.clone(),
            config.upload_policy(),
            Duration::from_secs(config.upload_url_ttl_secs()),
            Duration::from_secs(config.read_url_ttl_secs()),
        );

        Self {
            config,
            stores,
            storage: storage.storage,
            local_storage: storage.local,
            broker,
        }
    }
}

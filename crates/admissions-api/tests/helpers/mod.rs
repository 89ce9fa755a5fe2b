//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p admissions-api`. Tests use the in-memory
//! stores and the local storage backend in a temp directory, so no Docker is needed.

pub mod auth;
pub mod uploads;

use admissions_api::constants;
use admissions_api::setup::routes;
use admissions_api::state::AppState;
use admissions_core::{Config, PortalConfig};
use admissions_db::Stores;
use admissions_storage::create_storage;
use axum::Router;
use axum_test::TestServer;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

/// Base URL the local backend signs URLs against in router-level tests
pub const TEST_BASE_URL: &str = "http://localhost:4000";

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server, state and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn applicant(&self) -> auth::TestUser {
        auth::TestUser::applicant(Uuid::new_v4())
    }

    pub fn reviewer(&self) -> auth::TestUser {
        auth::TestUser::reviewer()
    }

    pub async fn set_applications_open(&self, is_open: bool) {
        self.state
            .stores
            .settings
            .set_applications_open(is_open)
            .await
            .expect("Failed to set applications gate");
    }
}

pub fn test_config(storage_path: &str, base_url: &str) -> Config {
    let vars: HashMap<&str, String> = HashMap::from([
        ("ENVIRONMENT", "test".to_string()),
        ("JWT_SECRET", auth::TEST_JWT_SECRET.to_string()),
        ("DATABASE_URL", "memory://".to_string()),
        ("STORAGE_BACKEND", "local".to_string()),
        ("LOCAL_STORAGE_PATH", storage_path.to_string()),
        ("LOCAL_STORAGE_BASE_URL", base_url.to_string()),
        (
            "LOCAL_STORAGE_SIGNING_SECRET",
            "local-signing-secret-for-integration-tests".to_string(),
        ),
    ]);
    let portal = PortalConfig::from_lookup(|key| vars.get(key).cloned())
        .expect("Failed to build test config");
    Config(Box::new(portal))
}

/// Build the full router over in-memory stores and temp-dir local storage.
pub async fn build_test_router(base_url: &str) -> (Router, Arc<AppState>, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let config = test_config(
        temp_dir.path().to_str().expect("temp dir is valid UTF-8"),
        base_url,
    );

    let storage = create_storage(&config)
        .await
        .expect("Failed to create local storage");
    let state = Arc::new(AppState::new(config.clone(), Stores::in_memory(), storage));
    let router = routes::setup_routes(&config, state.clone()).expect("Failed to build routes");

    (router, state, temp_dir)
}

/// Setup test app. The applications gate starts as given.
pub async fn setup_test_app(applications_open: bool) -> TestApp {
    let (router, state, temp_dir) = build_test_router(TEST_BASE_URL).await;
    let server = TestServer::new(router).expect("Failed to create test server");

    let app = TestApp {
        server,
        state,
        _temp_dir: temp_dir,
    };
    app.set_applications_open(applications_open).await;
    app
}

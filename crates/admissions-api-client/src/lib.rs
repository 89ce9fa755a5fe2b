//! HTTP client for the admissions portal API.
//!
//! Provides a bearer-authenticated client with generic JSON helpers, domain methods
//! (gate, applications, upload authorization, status), the direct upload executor that
//! PUTs bytes to presigned URLs, and the document submission workflow built on them.
//! The CLI binaries and the end-to-end tests use this crate directly.

pub mod api;
pub mod config;
pub mod error;
pub mod executor;
pub mod workflow;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

pub use config::ClientConfig;
pub use error::{FailureKind, UploadFailed, WorkflowError, WorkflowWarning};
pub use executor::DirectUploadExecutor;
pub use workflow::{
    FileUpload, RecordCommitter, SubmissionGate, SubmissionOutcome, SubmissionTarget,
    SubmissionWorkflow, UploadBroker, UploadExecutor, UploadSource, UploadState,
};

/// API version prefix; must match the server
pub const API_PREFIX: &str = "/api/v0";

/// Non-2xx answer from the API. Recover it from an `anyhow::Error` with `downcast_ref`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("API request failed with status {status}: {message}")]
pub struct ApiStatusError {
    pub status: u16,
    /// Machine-readable `code` from the error body, when there is one
    pub code: Option<String>,
    pub message: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    code: Option<String>,
}

/// HTTP client for the admissions API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token,
        })
    }

    /// Create client from `ADMISSIONS_API_URL` and `ADMISSIONS_API_TOKEN`.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("Authorization", format!("Bearer {}", self.token))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self
            .authorized(request)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let (message, code) = match serde_json::from_str::<ErrorBody>(&text) {
                Ok(body) => (body.error, body.code),
                Err(_) => (text, None),
            };
            return Err(ApiStatusError {
                status: status.as_u16(),
                code,
                message,
            }
            .into());
        }

        response
            .json()
            .await
            .context("Failed to parse response as JSON")
    }

    /// GET and deserialize the JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(self.client.get(self.build_url(path))).await
    }

    /// POST without a body.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(self.client.post(self.build_url(path))).await
    }

    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send(self.client.post(self.build_url(path)).json(body))
            .await
    }

    pub async fn put_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send(self.client.put(self.build_url(path)).json(body))
            .await
    }

    pub async fn patch_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send(self.client.patch(self.build_url(path)).json(body))
            .await
    }
}

/// Status code of a failed API call, if the server answered at all.
pub fn api_status(err: &anyhow::Error) -> Option<&ApiStatusError> {
    err.downcast_ref::<ApiStatusError>()
}

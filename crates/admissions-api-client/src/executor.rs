//! Direct upload to a presigned URL.

use crate::error::UploadFailed;
use crate::workflow::UploadExecutor;
use admissions_core::models::UploadAuthorization;
use anyhow::Context;
use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;

/// Headers the HTTP stack sets from the body and URL itself
const TRANSPORT_HEADERS: &[&str] = &["content-length", "host"];

/// Sends document bytes straight to object storage.
#[derive(Clone)]
pub struct DirectUploadExecutor {
    client: Client,
}

impl DirectUploadExecutor {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .context("Failed to create upload HTTP client")?;
        Ok(Self { client })
    }

    /// PUT `body` to the authorization's target with its required headers.
    ///
    /// Any transport error or non-2xx answer (expired signature, checksum mismatch,
    /// provider error) is an `UploadFailed`.
    #[tracing::instrument(
        skip(self, authorization, body),
        fields(object_key = %authorization.object_key, size_bytes = body.len())
    )]
    pub async fn upload(
        &self,
        authorization: &UploadAuthorization,
        body: Bytes,
    ) -> Result<(), UploadFailed> {
        let size_bytes = body.len() as u64;
        let failed = |provider_status: Option<u16>| UploadFailed {
            object_key: authorization.object_key.clone(),
            size_bytes,
            provider_status,
        };

        let mut request = self.client.put(&authorization.target_url).body(body);
        for (name, value) in &authorization.required_headers {
            if TRANSPORT_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
                continue;
            }
            request = request.header(name.as_str(), value.as_str());
        }

        let start = std::time::Instant::now();
        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e.without_url(), "Upload request failed");
            failed(None)
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(provider_status = status.as_u16(), "Storage rejected upload");
            return Err(failed(Some(status.as_u16())));
        }

        tracing::info!(
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Direct upload completed"
        );
        Ok(())
    }
}

#[async_trait::async_trait]
impl UploadExecutor for DirectUploadExecutor {
    async fn upload(
        &self,
        authorization: &UploadAuthorization,
        body: Bytes,
    ) -> Result<(), UploadFailed> {
        DirectUploadExecutor::upload(self, authorization, body).await
    }
}

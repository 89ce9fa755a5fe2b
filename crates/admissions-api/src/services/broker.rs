//! Upload URL broker.
//!
//! Validates an upload request and mints a short-lived write authorization bound to the
//! object key, content type, size and checksum. The storage provider enforces those
//! bindings at transfer time, so a client cannot reuse an authorization for other bytes.

use crate::error::storage_error;
use admissions_core::models::{AuthorizeUploadRequest, ReadAuthorization, UploadAuthorization};
use admissions_core::{is_owned_by, AppError, IntegrityToken, UploadPolicy};
use admissions_storage::{PutConstraints, Storage};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct UploadUrlBroker {
    storage: Arc<dyn Storage>,
    policy: UploadPolicy,
    upload_ttl: Duration,
    read_ttl: Duration,
}

impl UploadUrlBroker {
    pub fn new(
        storage: Arc<dyn Storage>,
        policy: UploadPolicy,
        upload_ttl: Duration,
        read_ttl: Duration,
    ) -> Self {
        Self {
            storage,
            policy,
            upload_ttl,
            read_ttl,
        }
    }

    /// Issue a write authorization for one of the caller's slots.
    ///
    /// Checks run in a fixed order: content type, size, integrity token, then key
    /// ownership. Nothing is signed unless all of them pass.
    #[tracing::instrument(
        skip(self, request),
        fields(
            owner_id = %owner_id,
            object_key = %request.object_key,
            size_bytes = request.size_bytes,
            operation = "authorize_upload"
        )
    )]
    pub async fn authorize(
        &self,
        owner_id: Uuid,
        request: &AuthorizeUploadRequest,
    ) -> Result<UploadAuthorization, AppError> {
        self.policy
            .validate(&request.content_type, request.size_bytes)?;

        let checksum = IntegrityToken::parse(&request.integrity_token)
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;

        request.validate()?;

        if !is_owned_by(&request.object_key, owner_id) {
            tracing::warn!("Upload authorization refused for foreign object key");
            return Err(AppError::Forbidden(
                "Object key does not belong to the caller".to_string(),
            ));
        }

        let constraints = PutConstraints {
            content_type: request.content_type.trim().to_lowercase(),
            content_length: request.size_bytes,
            checksum_sha256: checksum,
        };

        let expires_at = expiry_from_now(self.upload_ttl);
        let presigned = self
            .storage
            .presign_put(&request.object_key, &constraints, self.upload_ttl)
            .await
            .map_err(storage_error)?;

        tracing::info!(
            backend = %self.storage.backend_type(),
            expires_in_secs = self.upload_ttl.as_secs(),
            "Upload authorized"
        );

        Ok(UploadAuthorization {
            target_url: presigned.url,
            expires_at,
            object_key: request.object_key.clone(),
            required_headers: presigned.headers,
        })
    }

    /// Issue a read authorization. Access checks are the caller's job.
    #[tracing::instrument(skip(self), fields(operation = "authorize_read"))]
    pub async fn authorize_read(&self, object_key: &str) -> Result<ReadAuthorization, AppError> {
        let expires_at = expiry_from_now(self.read_ttl);
        let presigned = self
            .storage
            .presign_get(object_key, self.read_ttl)
            .await
            .map_err(storage_error)?;

        Ok(ReadAuthorization {
            target_url: presigned.url,
            expires_at,
            object_key: object_key.to_string(),
        })
    }
}

fn expiry_from_now(ttl: Duration) -> DateTime<Utc> {
    Utc::now() + chrono::Duration::seconds(ttl.as_secs() as i64)
}

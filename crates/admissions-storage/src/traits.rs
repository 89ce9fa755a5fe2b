//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.
//! The portal never moves document bytes through the API for S3: it only mints
//! presigned requests and checks whether objects exist.

use crate::StorageBackend;
use admissions_core::IntegrityToken;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
///
/// Messages never include presigned URLs.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Presigning failed: {0}")]
    PresignFailed(String),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Signature expired")]
    Expired,

    #[error("Checksum mismatch for {0}")]
    ChecksumMismatch(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Values a presigned PUT is bound to. The provider rejects a transfer that differs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutConstraints {
    pub content_type: String,
    pub content_length: u64,
    pub checksum_sha256: IntegrityToken,
}

/// A signed request a client can send without further credentials.
#[derive(Clone)]
pub struct PresignedRequest {
    pub url: String,
    /// Headers the client must send unchanged
    pub headers: BTreeMap<String, String>,
}

impl fmt::Debug for PresignedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresignedRequest")
            .field("url", &"<redacted>")
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) must implement this trait.
///
/// **Key format:** keys are deterministic per owner and slot,
/// `applications/{owner_id}/{slot}`. See `admissions_core::storage_keys`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Generate a presigned PUT for a direct upload bound to `constraints`
    async fn presign_put(
        &self,
        storage_key: &str,
        constraints: &PutConstraints,
        expires_in: Duration,
    ) -> StorageResult<PresignedRequest>;

    /// Generate a presigned GET for temporary read access
    async fn presign_get(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<PresignedRequest>;

    /// Check if an object exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

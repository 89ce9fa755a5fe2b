//! Local filesystem storage.
//!
//! Presigned requests point at the API's `/local-objects/{key}` route and carry an
//! HMAC-SHA256 signature over the method, key, expiry and (for PUT) the bound content
//! type, length and checksum. The route verifies the signature and the body digest
//! before touching the filesystem, mirroring what S3 enforces for real buckets.

use crate::traits::{PresignedRequest, PutConstraints, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use admissions_core::constants::CHECKSUM_HEADER;
use admissions_core::IntegrityToken;
use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Route prefix the API serves local objects under
pub const LOCAL_OBJECTS_ROUTE: &str = "/local-objects";

/// Query parameters of a locally signed URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedQuery {
    pub expires: i64,
    pub signature: String,
}

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    signing_key: Vec<u8>,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for object storage
    /// * `base_url` - Public base URL of the API serving `/local-objects`
    /// * `signing_secret` - Secret for URL signatures
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        signing_secret: &[u8],
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        if signing_secret.is_empty() {
            return Err(StorageError::ConfigError(
                "Local storage signing secret must not be empty".to_string(),
            ));
        }

        Ok(LocalStorage {
            base_path,
            base_url: base_url.trim_end_matches('/').to_string(),
            signing_key: signing_secret.to_vec(),
        })
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// Only plain relative segments are accepted, so the path cannot escape the
    /// base directory.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.is_empty() || storage_key.contains("..") || storage_key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let relative = Path::new(storage_key);
        if storage_key.split('/').any(|s| s.is_empty() || s == ".")
            || !relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::InvalidKey(
                "Storage key resolves outside storage directory".to_string(),
            ));
        }

        Ok(self.base_path.join(relative))
    }

    fn object_url(&self, storage_key: &str) -> String {
        format!("{}{}/{}", self.base_url, LOCAL_OBJECTS_ROUTE, storage_key)
    }

    fn mac(&self) -> Hmac<Sha256> {
        Hmac::<Sha256>::new_from_slice(&self.signing_key).expect("HMAC accepts any key size")
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn verify(&self, payload: &str, query: &SignedQuery) -> StorageResult<()> {
        let tag = hex::decode(&query.signature).map_err(|_| StorageError::InvalidSignature)?;
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&tag)
            .map_err(|_| StorageError::InvalidSignature)?;

        if Utc::now().timestamp() > query.expires {
            return Err(StorageError::Expired);
        }
        Ok(())
    }

    fn expiry(expires_in: Duration) -> i64 {
        Utc::now().timestamp() + expires_in.as_secs() as i64
    }

    fn signed_url(&self, storage_key: &str, expires: i64, signature: &str) -> String {
        format!(
            "{}?expires={}&sig={}",
            self.object_url(storage_key),
            expires,
            signature
        )
    }

    /// Check a PUT against its signature, then store the body if its digest matches.
    ///
    /// `content_type` and `checksum` are the values the client actually sent.
    pub async fn accept_signed_put(
        &self,
        storage_key: &str,
        query: &SignedQuery,
        content_type: &str,
        checksum: &str,
        body: &[u8],
    ) -> StorageResult<()> {
        let constraints = PutConstraints {
            content_type: content_type.to_string(),
            content_length: body.len() as u64,
            checksum_sha256: IntegrityToken::parse(checksum)
                .map_err(|_| StorageError::InvalidSignature)?,
        };
        self.verify(&put_payload(storage_key, query.expires, &constraints), query)?;

        if admissions_core::compute(body) != constraints.checksum_sha256 {
            return Err(StorageError::ChecksumMismatch(storage_key.to_string()));
        }

        self.write_object(storage_key, body).await
    }

    /// Check a GET against its signature and return the object bytes.
    pub async fn read_signed(
        &self,
        storage_key: &str,
        query: &SignedQuery,
    ) -> StorageResult<Vec<u8>> {
        self.verify(&get_payload(storage_key, query.expires), query)?;
        self.read_object(storage_key).await
    }

    /// Write an object, replacing any previous content at the key
    pub async fn write_object(&self, storage_key: &str, data: &[u8]) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            key = %storage_key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage write successful"
        );

        Ok(())
    }

    pub async fn read_object(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(storage_key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }

        fs::read(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })
    }
}

fn put_payload(storage_key: &str, expires: i64, constraints: &PutConstraints) -> String {
    format!(
        "PUT\n{}\n{}\n{}\n{}\n{}",
        storage_key,
        expires,
        constraints.content_type.to_lowercase(),
        constraints.content_length,
        constraints.checksum_sha256
    )
}

fn get_payload(storage_key: &str, expires: i64) -> String {
    format!("GET\n{}\n{}", storage_key, expires)
}

#[async_trait]
impl Storage for LocalStorage {
    async fn presign_put(
        &self,
        storage_key: &str,
        constraints: &PutConstraints,
        expires_in: Duration,
    ) -> StorageResult<PresignedRequest> {
        self.key_to_path(storage_key)?;
        let expires = Self::expiry(expires_in);
        let signature = self.sign(&put_payload(storage_key, expires, constraints));

        let mut headers = BTreeMap::new();
        headers.insert(
            "content-type".to_string(),
            constraints.content_type.clone(),
        );
        headers.insert(
            CHECKSUM_HEADER.to_string(),
            constraints.checksum_sha256.to_string(),
        );

        Ok(PresignedRequest {
            url: self.signed_url(storage_key, expires, &signature),
            headers,
        })
    }

    async fn presign_get(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<PresignedRequest> {
        self.key_to_path(storage_key)?;
        let expires = Self::expiry(expires_in);
        let signature = self.sign(&get_payload(storage_key, expires));

        Ok(PresignedRequest {
            url: self.signed_url(storage_key, expires, &signature),
            headers: BTreeMap::new(),
        })
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// Pull `expires` and `sig` out of a presigned URL's query string.
pub fn parse_signed_query(query: &str) -> Option<SignedQuery> {
    let mut expires = None;
    let mut signature = None;
    for pair in query.split('&') {
        let (name, value) = pair.split_once('=')?;
        let value = urlencoding::decode(value).ok()?;
        match name {
            "expires" => expires = value.parse::<i64>().ok(),
            "sig" => signature = Some(value.into_owned()),
            _ => {}
        }
    }
    Some(SignedQuery {
        expires: expires?,
        signature: signature?,
    })
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Request for a write authorization (presigned PUT URL)
///
/// The owner is taken from the caller's identity, not from the body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct AuthorizeUploadRequest {
    /// Deterministic key of the slot being written
    #[validate(length(
        min = 1,
        max = 512,
        message = "Object key must be between 1 and 512 characters"
    ))]
    pub object_key: String,
    /// Content type (MIME type)
    #[validate(length(
        min = 1,
        max = 255,
        message = "Content type must be between 1 and 255 characters"
    ))]
    pub content_type: String,
    /// File size in bytes
    pub size_bytes: u64,
    /// Base64 SHA-256 of the file bytes, parsed after the type and size checks
    pub integrity_token: String,
}

/// Time-limited permission to PUT one object
///
/// `target_url` carries signing material: never log it.
#[derive(Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadAuthorization {
    pub target_url: String,
    pub expires_at: DateTime<Utc>,
    /// Key the signature is bound to
    pub object_key: String,
    /// Headers that must accompany the PUT for the signature to verify
    pub required_headers: BTreeMap<String, String>,
}

impl std::fmt::Debug for UploadAuthorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadAuthorization")
            .field("target_url", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("object_key", &self.object_key)
            .finish()
    }
}

/// Time-limited permission to GET one object
#[derive(Clone, Serialize, Deserialize, ToSchema)]
pub struct ReadAuthorization {
    pub target_url: String,
    pub expires_at: DateTime<Utc>,
    pub object_key: String,
}

impl std::fmt::Debug for ReadAuthorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadAuthorization")
            .field("target_url", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("object_key", &self.object_key)
            .finish()
    }
}

/// Slot whose deterministic key exists in storage but has no committed reference
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrphanedObject {
    pub owner_id: Uuid,
    pub slot: crate::models::FileSlot,
    pub object_key: String,
}

/// Result of comparing storage against committed references for one application
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReconciliationReport {
    pub application_id: Uuid,
    pub orphaned: Vec<OrphanedObject>,
    /// References whose object is missing from storage
    pub dangling: Vec<crate::models::StoredObjectReference>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_target_url() {
        let auth = UploadAuthorization {
            target_url: "https://bucket.example/key?X-Amz-Signature=secret".to_string(),
            expires_at: Utc::now(),
            object_key: "applications/x/report".to_string(),
            required_headers: BTreeMap::new(),
        };
        let rendered = format!("{:?}", auth);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("applications/x/report"));
    }
}

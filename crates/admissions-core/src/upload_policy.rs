//! Content-type and size policy for application documents.
//!
//! Shared by the broker (authoritative check) and the client workflow, which runs the
//! same checks before any network call.

use crate::constants::{ACCEPTED_CONTENT_TYPES, MAX_UPLOAD_SIZE_BYTES};
use crate::error::AppError;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyViolation {
    #[error("Unsupported content type: {content_type} (allowed: {allowed:?})")]
    UnsupportedType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    PayloadTooLarge { size: u64, max: u64 },

    #[error("Empty file")]
    EmptyFile,
}

impl From<PolicyViolation> for AppError {
    fn from(err: PolicyViolation) -> Self {
        match err {
            PolicyViolation::UnsupportedType {
                content_type,
                allowed,
            } => AppError::UnsupportedType {
                content_type,
                allowed,
            },
            PolicyViolation::PayloadTooLarge { size, max } => {
                AppError::PayloadTooLarge { size, max }
            }
            PolicyViolation::EmptyFile => AppError::InvalidInput("File is empty".to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadPolicy {
    allowed_content_types: Vec<String>,
    max_size_bytes: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(
            ACCEPTED_CONTENT_TYPES.iter().map(|s| s.to_string()).collect(),
            MAX_UPLOAD_SIZE_BYTES,
        )
    }
}

impl UploadPolicy {
    pub fn new(allowed_content_types: Vec<String>, max_size_bytes: u64) -> Self {
        Self {
            allowed_content_types: allowed_content_types
                .into_iter()
                .map(|ct| ct.trim().to_lowercase())
                .filter(|ct| !ct.is_empty())
                .collect(),
            max_size_bytes,
        }
    }

    pub fn allowed_content_types(&self) -> &[String] {
        &self.allowed_content_types
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    /// Content type is compared case-insensitively.
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), PolicyViolation> {
        let normalized = content_type.trim().to_lowercase();

        if !self
            .allowed_content_types
            .iter()
            .any(|ct| ct == &normalized)
        {
            return Err(PolicyViolation::UnsupportedType {
                content_type: content_type.to_string(),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(())
    }

    pub fn validate_size(&self, size: u64) -> Result<(), PolicyViolation> {
        if size > self.max_size_bytes {
            return Err(PolicyViolation::PayloadTooLarge {
                size,
                max: self.max_size_bytes,
            });
        }

        if size == 0 {
            return Err(PolicyViolation::EmptyFile);
        }

        Ok(())
    }

    /// Type first, then size.
    pub fn validate(&self, content_type: &str, size: u64) -> Result<(), PolicyViolation> {
        self.validate_content_type(content_type)?;
        self.validate_size(size)
    }
}

/// Guess a document's content type from its file extension.
pub fn content_type_for_path(path: &Path) -> Option<&'static str> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())?;

    match extension.as_str() {
        "pdf" => Some("application/pdf"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_listed_types_case_insensitively() {
        let policy = UploadPolicy::default();
        assert!(policy.validate_content_type("application/pdf").is_ok());
        assert!(policy.validate_content_type("IMAGE/PNG").is_ok());
        assert!(policy.validate_content_type("image/jpg").is_ok());
    }

    #[test]
    fn test_rejects_unlisted_type() {
        let policy = UploadPolicy::default();
        match policy.validate_content_type("application/zip") {
            Err(PolicyViolation::UnsupportedType { content_type, allowed }) => {
                assert_eq!(content_type, "application/zip");
                assert_eq!(allowed.len(), ACCEPTED_CONTENT_TYPES.len());
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_size_boundary() {
        let policy = UploadPolicy::default();
        assert!(policy.validate_size(15_728_640).is_ok());
        assert_eq!(
            policy.validate_size(15_728_641),
            Err(PolicyViolation::PayloadTooLarge {
                size: 15_728_641,
                max: 15_728_640
            })
        );
        assert_eq!(policy.validate_size(0), Err(PolicyViolation::EmptyFile));
    }

    #[test]
    fn test_type_is_checked_before_size() {
        let policy = UploadPolicy::default();
        assert!(matches!(
            policy.validate("text/plain", 20 * 1024 * 1024),
            Err(PolicyViolation::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_violation_maps_to_app_error() {
        let err: AppError = PolicyViolation::PayloadTooLarge { size: 2, max: 1 }.into();
        assert!(matches!(err, AppError::PayloadTooLarge { size: 2, max: 1 }));
        let err: AppError = PolicyViolation::EmptyFile.into();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_content_type_for_path() {
        assert_eq!(
            content_type_for_path(Path::new("grades.PDF")),
            Some("application/pdf")
        );
        assert_eq!(content_type_for_path(Path::new("scan.jpeg")), Some("image/jpeg"));
        assert_eq!(content_type_for_path(Path::new("notes.txt")), None);
        assert_eq!(content_type_for_path(Path::new("no_extension")), None);
    }
}

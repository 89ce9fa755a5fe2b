//! Outcomes of the submission workflow that are not success.

use admissions_core::models::StoredObjectReference;
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

/// Transfer to storage did not complete.
///
/// Deliberately carries no URL: presigned URLs contain signing material.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Upload of {object_key} ({size_bytes} bytes) failed {}", provider_outcome(.provider_status))]
pub struct UploadFailed {
    pub object_key: String,
    pub size_bytes: u64,
    /// HTTP status from the storage provider; `None` when no response arrived
    pub provider_status: Option<u16>,
}

fn provider_outcome(provider_status: &Option<u16>) -> String {
    match provider_status {
        Some(status) => format!("with provider status {}", status),
        None => "before the provider answered".to_string(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Applications are closed")]
    SubmissionsClosed,

    #[error("Unsupported content type: {content_type}")]
    UnsupportedType { content_type: String },

    #[error("File too large: {size_bytes} bytes (max: {max_bytes} bytes)")]
    PayloadTooLarge { size_bytes: u64, max_bytes: u64 },

    #[error("Upload authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error(transparent)]
    UploadFailed(#[from] UploadFailed),

    /// Bytes are in storage but no reference points at them.
    #[error(
        "Orphaned upload: object {object_key} for owner {owner} was stored at {occurred_at} but not committed: {reason}"
    )]
    OrphanedUpload {
        owner: Uuid,
        object_key: String,
        occurred_at: DateTime<Utc>,
        /// References committed earlier in the same submission
        committed: Vec<StoredObjectReference>,
        reason: String,
    },

    #[error("Could not read {path}: {reason}")]
    UnreadableFile { path: String, reason: String },
}

impl WorkflowError {
    /// Message safe to show the applicant. Never includes URLs or server detail.
    ///
    /// An orphaned upload names the owner, object key and time so the applicant can
    /// quote them to support.
    pub fn user_message(&self) -> String {
        match self {
            WorkflowError::SubmissionsClosed => {
                "Applications are currently closed. Your documents were not submitted.".to_string()
            }
            WorkflowError::UnsupportedType { .. } => {
                "This file type is not accepted. Upload a PDF, PNG, JPEG or WebP file.".to_string()
            }
            WorkflowError::PayloadTooLarge { max_bytes, .. } => format!(
                "This file is too large. The maximum size is {} MB.",
                max_bytes / (1024 * 1024)
            ),
            WorkflowError::AuthorizationDenied { .. } => {
                "The upload was not authorized. Please try again.".to_string()
            }
            WorkflowError::UploadFailed(_) => {
                "The upload did not complete. Please try again.".to_string()
            }
            WorkflowError::OrphanedUpload {
                owner,
                object_key,
                occurred_at,
                committed,
                ..
            } => {
                let saved = if committed.is_empty() {
                    "No other file from this submission was saved.".to_string()
                } else {
                    let slots: Vec<String> = committed.iter().map(|r| r.slot.to_string()).collect();
                    format!("Already saved: {}.", slots.join(", "))
                };
                format!(
                    "Your file was uploaded but could not be saved to your application. \
                     Contact admissions support quoting owner {}, object {}, stored at {}. {}",
                    owner,
                    object_key,
                    occurred_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                    saved
                )
            }
            WorkflowError::UnreadableFile { .. } => {
                "The selected file could not be read.".to_string()
            }
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            WorkflowError::SubmissionsClosed => FailureKind::SubmissionsClosed,
            WorkflowError::UnsupportedType { .. } => FailureKind::UnsupportedType,
            WorkflowError::PayloadTooLarge { .. } => FailureKind::PayloadTooLarge,
            WorkflowError::AuthorizationDenied { .. } => FailureKind::AuthorizationDenied,
            WorkflowError::UploadFailed(_) => FailureKind::UploadFailed,
            WorkflowError::OrphanedUpload { .. } => FailureKind::OrphanedUpload,
            WorkflowError::UnreadableFile { .. } => FailureKind::UnreadableFile,
        }
    }

    /// Needs someone with storage access, not just a retry by the applicant.
    pub fn is_operator_actionable(&self) -> bool {
        self.kind() == FailureKind::OrphanedUpload
    }
}

/// Which `WorkflowError` ended a file, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    SubmissionsClosed,
    UnsupportedType,
    PayloadTooLarge,
    AuthorizationDenied,
    UploadFailed,
    OrphanedUpload,
    UnreadableFile,
}

/// Non-fatal problems; the submission still counts as done.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowWarning {
    #[error("Report for application {application_id} was replaced but its review status could not be reset: {reason}")]
    StatusResetFailed { application_id: Uuid, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use admissions_core::models::FileSlot;

    #[test]
    fn test_orphaned_upload_names_owner_key_and_time() {
        let owner = Uuid::new_v4();
        let occurred_at = Utc::now();
        let object_key = format!("applications/{}/report", owner);
        let err = WorkflowError::OrphanedUpload {
            owner,
            object_key: object_key.clone(),
            occurred_at,
            committed: Vec::new(),
            reason: "database unavailable".to_string(),
        };

        let rendered = err.to_string();
        assert!(rendered.contains(&owner.to_string()));
        assert!(rendered.contains("/report"));
        assert!(rendered.contains(&occurred_at.to_string()));
        assert!(err.is_operator_actionable());

        let message = err.user_message();
        assert!(message.contains(&owner.to_string()));
        assert!(message.contains(&object_key));
        assert!(message.contains(&occurred_at.to_rfc3339_opts(SecondsFormat::Secs, true)));
        assert!(message.contains("No other file"));
        assert!(!message.contains("database unavailable"));
    }

    #[test]
    fn test_orphaned_upload_lists_committed_slots() {
        let owner = Uuid::new_v4();
        let application_id = Uuid::new_v4();
        let committed = [FileSlot::SchoolCertificate, FileSlot::Grades]
            .into_iter()
            .map(|slot| StoredObjectReference {
                application_id,
                slot,
                object_key: format!("applications/{}/{}", owner, slot),
                committed_at: Utc::now(),
            })
            .collect();
        let err = WorkflowError::OrphanedUpload {
            owner,
            object_key: format!("applications/{}/report", owner),
            occurred_at: Utc::now(),
            committed,
            reason: "timeout".to_string(),
        };

        assert!(err
            .user_message()
            .contains("Already saved: school_certificate, grades."));
    }

    #[test]
    fn test_ordinary_failures_are_not_operator_actionable() {
        let errors = [
            WorkflowError::SubmissionsClosed,
            WorkflowError::UnsupportedType {
                content_type: "application/zip".to_string(),
            },
            WorkflowError::PayloadTooLarge {
                size_bytes: 20 * 1024 * 1024,
                max_bytes: 15 * 1024 * 1024,
            },
            WorkflowError::AuthorizationDenied {
                reason: "forbidden".to_string(),
            },
            WorkflowError::UploadFailed(UploadFailed {
                object_key: "applications/x/grades".to_string(),
                size_bytes: 10,
                provider_status: Some(403),
            }),
        ];
        let kinds: Vec<FailureKind> = errors.iter().map(WorkflowError::kind).collect();
        assert_eq!(
            kinds,
            vec![
                FailureKind::SubmissionsClosed,
                FailureKind::UnsupportedType,
                FailureKind::PayloadTooLarge,
                FailureKind::AuthorizationDenied,
                FailureKind::UploadFailed,
            ]
        );
        for err in errors {
            assert!(!err.is_operator_actionable(), "{}", err);
        }
    }

    #[test]
    fn test_user_messages_hide_internals() {
        let err = WorkflowError::UploadFailed(UploadFailed {
            object_key: "applications/x/grades".to_string(),
            size_bytes: 10,
            provider_status: Some(500),
        });
        assert_eq!(
            err.to_string(),
            "Upload of applications/x/grades (10 bytes) failed with provider status 500"
        );
        let unanswered = UploadFailed {
            object_key: "applications/x/grades".to_string(),
            size_bytes: 10,
            provider_status: None,
        };
        assert!(unanswered.to_string().ends_with("failed before the provider answered"));
        assert!(!err.user_message().contains("applications/"));

        let too_large = WorkflowError::PayloadTooLarge {
            size_bytes: 16 * 1024 * 1024,
            max_bytes: 15 * 1024 * 1024,
        };
        assert!(too_large.user_message().contains("15 MB"));
    }
}

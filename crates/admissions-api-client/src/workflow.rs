//! Document submission workflow.
//!
//! Each file goes through
//! `ComputingChecksum -> RequestingAuthorization -> Uploading -> CommittingReference ->
//! [ResettingStatus] -> Done`, and any step can end in `Failed`. Files are processed one
//! at a time and the first failure aborts the rest.
//!
//! There is no transaction across storage and the application record. Once bytes are
//! stored, a failed commit is reported as `OrphanedUpload` so an operator can reconcile
//! it. Object keys are deterministic per slot, so a retry overwrites the same object.
//! Dropping the submission future at any await point leaves only what already
//! completed.

use crate::error::{FailureKind, UploadFailed, WorkflowError, WorkflowWarning};
use crate::executor::DirectUploadExecutor;
use crate::ApiClient;
use admissions_core::models::{
    ApplicationResponse, AuthorizeUploadRequest, FileSlot, ReportStatus, ReviewStatusUpdate,
    StoredObjectReference, UploadAuthorization,
};
use admissions_core::{
    compute, compute_reader, content_type_for_path, object_key, IntegrityToken, PolicyViolation,
    UploadPolicy,
};
use bytes::Bytes;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Reads the `applications-open` setting.
#[async_trait::async_trait]
pub trait SubmissionGate: Send + Sync {
    async fn applications_open(&self) -> anyhow::Result<bool>;
}

/// Issues write authorizations.
#[async_trait::async_trait]
pub trait UploadBroker: Send + Sync {
    async fn authorize(
        &self,
        request: &AuthorizeUploadRequest,
    ) -> Result<UploadAuthorization, WorkflowError>;
}

/// Moves bytes to storage under an authorization.
#[async_trait::async_trait]
pub trait UploadExecutor: Send + Sync {
    async fn upload(
        &self,
        authorization: &UploadAuthorization,
        body: Bytes,
    ) -> Result<(), UploadFailed>;
}

/// Durable application record writes. The two calls are independent.
#[async_trait::async_trait]
pub trait RecordCommitter: Send + Sync {
    async fn attach_object(
        &self,
        application_id: Uuid,
        slot: FileSlot,
        object_key: &str,
    ) -> anyhow::Result<StoredObjectReference>;

    async fn reset_review_status(
        &self,
        application_id: Uuid,
        update: ReviewStatusUpdate,
    ) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    ComputingChecksum,
    RequestingAuthorization,
    Uploading,
    CommittingReference,
    ResettingStatus,
    Done,
    Failed(FailureKind),
}

impl UploadState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadState::Done | UploadState::Failed(_))
    }
}

#[derive(Debug, Clone)]
pub enum UploadSource {
    Bytes(Bytes),
    Path(PathBuf),
}

/// One document to place in a slot
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub slot: FileSlot,
    pub content_type: String,
    pub source: UploadSource,
}

impl FileUpload {
    pub fn from_bytes(
        slot: FileSlot,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            slot,
            content_type: content_type.into(),
            source: UploadSource::Bytes(bytes.into()),
        }
    }

    /// Content type is taken from the file extension.
    pub fn from_path(slot: FileSlot, path: impl Into<PathBuf>) -> Result<Self, WorkflowError> {
        let path = path.into();
        let content_type =
            content_type_for_path(&path).ok_or_else(|| WorkflowError::UnsupportedType {
                content_type: path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| format!(".{}", e))
                    .unwrap_or_else(|| "unknown".to_string()),
            })?;

        Ok(Self {
            slot,
            content_type: content_type.to_string(),
            source: UploadSource::Path(path),
        })
    }
}

/// Application the documents belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionTarget {
    pub application_id: Uuid,
    pub owner_id: Uuid,
}

impl From<&ApplicationResponse> for SubmissionTarget {
    fn from(application: &ApplicationResponse) -> Self {
        Self {
            application_id: application.id,
            owner_id: application.owner_id,
        }
    }
}

#[derive(Debug, Default)]
pub struct SubmissionOutcome {
    pub committed: Vec<StoredObjectReference>,
    pub warnings: Vec<WorkflowWarning>,
}

type ProgressFn = Arc<dyn Fn(FileSlot, &UploadState) + Send + Sync>;

pub struct SubmissionWorkflow {
    gate: Arc<dyn SubmissionGate>,
    broker: Arc<dyn UploadBroker>,
    executor: Arc<dyn UploadExecutor>,
    committer: Arc<dyn RecordCommitter>,
    policy: UploadPolicy,
    progress: Option<ProgressFn>,
}

impl SubmissionWorkflow {
    pub fn new(
        gate: Arc<dyn SubmissionGate>,
        broker: Arc<dyn UploadBroker>,
        executor: Arc<dyn UploadExecutor>,
        committer: Arc<dyn RecordCommitter>,
    ) -> Self {
        Self {
            gate,
            broker,
            executor,
            committer,
            policy: UploadPolicy::default(),
            progress: None,
        }
    }

    /// Wire the workflow to the API and direct uploads.
    pub fn from_client(client: ApiClient, executor: DirectUploadExecutor) -> Self {
        let client = Arc::new(client);
        Self::new(client.clone(), client.clone(), Arc::new(executor), client)
    }

    pub fn with_policy(mut self, policy: UploadPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Called on every state change of every file.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(FileSlot, &UploadState) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    fn enter(&self, slot: FileSlot, state: UploadState) {
        tracing::debug!(slot = %slot, state = ?state, "Upload state changed");
        if let Some(progress) = &self.progress {
            progress(slot, &state);
        }
    }

    /// Fails with `SubmissionsClosed` unless the gate reads open. An unreadable gate is
    /// a closed gate.
    pub async fn ensure_open(&self) -> Result<(), WorkflowError> {
        match self.gate.applications_open().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(WorkflowError::SubmissionsClosed),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read applications gate, treating as closed");
                Err(WorkflowError::SubmissionsClosed)
            }
        }
    }

    /// Submit `files` in order. Stops at the first failure.
    #[tracing::instrument(
        skip(self, files),
        fields(
            application_id = %target.application_id,
            owner_id = %target.owner_id,
            files = files.len()
        )
    )]
    pub async fn submit(
        &self,
        target: SubmissionTarget,
        files: Vec<FileUpload>,
    ) -> Result<SubmissionOutcome, WorkflowError> {
        self.ensure_open().await?;

        let mut outcome = SubmissionOutcome::default();
        for file in files {
            let slot = file.slot;
            match self.submit_file(target, file, &mut outcome).await {
                Ok(()) => self.enter(slot, UploadState::Done),
                Err(err) => {
                    self.enter(slot, UploadState::Failed(err.kind()));
                    return Err(err);
                }
            }
        }

        tracing::info!(
            committed = outcome.committed.len(),
            warnings = outcome.warnings.len(),
            "Submission completed"
        );
        Ok(outcome)
    }

    async fn submit_file(
        &self,
        target: SubmissionTarget,
        file: FileUpload,
        outcome: &mut SubmissionOutcome,
    ) -> Result<(), WorkflowError> {
        let slot = file.slot;

        self.enter(slot, UploadState::ComputingChecksum);
        self.policy
            .validate_content_type(&file.content_type)
            .map_err(policy_error)?;
        let (body, integrity_token) = self.load(&file.source).await?;

        let request = AuthorizeUploadRequest {
            object_key: object_key(target.owner_id, slot),
            content_type: file.content_type,
            size_bytes: body.len() as u64,
            integrity_token: integrity_token.to_string(),
        };

        self.enter(slot, UploadState::RequestingAuthorization);
        let authorization = self.broker.authorize(&request).await?;
        if authorization.object_key != request.object_key {
            return Err(WorkflowError::AuthorizationDenied {
                reason: "Authorization is bound to a different object".to_string(),
            });
        }

        self.enter(slot, UploadState::Uploading);
        self.executor.upload(&authorization, body).await?;
        let occurred_at = Utc::now();

        self.enter(slot, UploadState::CommittingReference);
        let reference = match self
            .committer
            .attach_object(target.application_id, slot, &authorization.object_key)
            .await
        {
            Ok(reference) => reference,
            Err(e) => {
                tracing::error!(
                    owner_id = %target.owner_id,
                    object_key = %authorization.object_key,
                    occurred_at = %occurred_at,
                    error = %e,
                    "Object stored but reference not committed"
                );
                return Err(WorkflowError::OrphanedUpload {
                    owner: target.owner_id,
                    object_key: authorization.object_key,
                    occurred_at,
                    committed: outcome.committed.clone(),
                    reason: e.to_string(),
                });
            }
        };
        outcome.committed.push(reference);

        if slot.resets_review_status() {
            self.enter(slot, UploadState::ResettingStatus);
            let reset = ReviewStatusUpdate::ReportStatus(ReportStatus::Pending);
            if let Err(e) = self
                .committer
                .reset_review_status(target.application_id, reset)
                .await
            {
                tracing::warn!(error = %e, "Report committed but review status not reset");
                outcome.warnings.push(WorkflowWarning::StatusResetFailed {
                    application_id: target.application_id,
                    reason: e.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Load the bytes to send and their integrity token.
    ///
    /// Files are size-checked, then hashed as a stream, before anything is read into
    /// memory.
    async fn load(
        &self,
        source: &UploadSource,
    ) -> Result<(Bytes, IntegrityToken), WorkflowError> {
        let (body, integrity_token) = match source {
            UploadSource::Bytes(bytes) => (bytes.clone(), compute(bytes)),
            UploadSource::Path(path) => {
                let metadata = tokio::fs::metadata(path)
                    .await
                    .map_err(|e| unreadable(path, e.to_string()))?;
                self.policy
                    .validate_size(metadata.len())
                    .map_err(policy_error)?;

                let (integrity_token, hashed_len) = hash_file(path).await?;
                let body = tokio::fs::read(path)
                    .await
                    .map_err(|e| unreadable(path, e.to_string()))?;
                if body.len() as u64 != hashed_len {
                    return Err(unreadable(path, "file changed while reading".to_string()));
                }
                (Bytes::from(body), integrity_token)
            }
        };

        self.policy
            .validate_size(body.len() as u64)
            .map_err(policy_error)?;
        Ok((body, integrity_token))
    }
}

async fn hash_file(path: &Path) -> Result<(IntegrityToken, u64), WorkflowError> {
    let owned = path.to_path_buf();
    tokio::task::spawn_blocking(move || std::fs::File::open(&owned).and_then(compute_reader))
        .await
        .map_err(|e| unreadable(path, e.to_string()))?
        .map_err(|e| unreadable(path, e.to_string()))
}

fn unreadable(path: &Path, reason: String) -> WorkflowError {
    WorkflowError::UnreadableFile {
        path: path.display().to_string(),
        reason,
    }
}

fn policy_error(violation: PolicyViolation) -> WorkflowError {
    match violation {
        PolicyViolation::UnsupportedType { content_type, .. } => {
            WorkflowError::UnsupportedType { content_type }
        }
        PolicyViolation::PayloadTooLarge { size, max } => WorkflowError::PayloadTooLarge {
            size_bytes: size,
            max_bytes: max,
        },
        PolicyViolation::EmptyFile => WorkflowError::UnreadableFile {
            path: "upload".to_string(),
            reason: "file is empty".to_string(),
        },
    }
}

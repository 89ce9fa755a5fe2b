//! Domain methods for the admissions API client.
//!
//! Request and response types come from `admissions_core::models`.

use crate::error::WorkflowError;
use crate::workflow::{RecordCommitter, SubmissionGate, UploadBroker};
use crate::{api_status, ApiClient, API_PREFIX};
use admissions_core::constants::MAX_UPLOAD_SIZE_BYTES;
use admissions_core::models::{
    ApplicationResponse, ApplicationsOpen, AttachObjectRequest, AuthorizeUploadRequest,
    FileSlot, ReadAuthorization, ReviewStatusUpdate, StoredObjectReference, UploadAuthorization,
};
use anyhow::Result;
use uuid::Uuid;

impl ApiClient {
    /// Read the public `applications-open` gate.
    pub async fn applications_open(&self) -> Result<ApplicationsOpen> {
        self.get(&format!("{}/settings/applications-open", API_PREFIX))
            .await
    }

    /// Open or close applications. Reviewer only.
    pub async fn set_applications_open(&self, is_open: bool) -> Result<ApplicationsOpen> {
        self.put_json(
            &format!("{}/settings/applications-open", API_PREFIX),
            &ApplicationsOpen { is_open },
        )
        .await
    }

    /// Create the caller's draft, or fetch it if it already exists.
    pub async fn create_application(&self) -> Result<ApplicationResponse> {
        self.post_empty(&format!("{}/applications", API_PREFIX))
            .await
    }

    pub async fn my_application(&self) -> Result<ApplicationResponse> {
        self.get(&format!("{}/applications/me", API_PREFIX)).await
    }

    pub async fn get_application(&self, application_id: Uuid) -> Result<ApplicationResponse> {
        self.get(&format!("{}/applications/{}", API_PREFIX, application_id))
            .await
    }

    pub async fn authorize_upload(
        &self,
        request: &AuthorizeUploadRequest,
    ) -> Result<UploadAuthorization> {
        self.post_json(&format!("{}/uploads/authorize", API_PREFIX), request)
            .await
    }

    pub async fn attach_object(
        &self,
        application_id: Uuid,
        slot: FileSlot,
        object_key: &str,
    ) -> Result<StoredObjectReference> {
        self.put_json(
            &format!("{}/applications/{}/files/{}", API_PREFIX, application_id, slot),
            &AttachObjectRequest {
                object_key: object_key.to_string(),
            },
        )
        .await
    }

    pub async fn update_status(
        &self,
        application_id: Uuid,
        update: ReviewStatusUpdate,
    ) -> Result<ApplicationResponse> {
        self.patch_json(
            &format!("{}/applications/{}/status", API_PREFIX, application_id),
            &update,
        )
        .await
    }

    pub async fn read_url(
        &self,
        application_id: Uuid,
        slot: FileSlot,
    ) -> Result<ReadAuthorization> {
        self.get(&format!(
            "{}/applications/{}/files/{}/read-url",
            API_PREFIX, application_id, slot
        ))
        .await
    }
}

#[async_trait::async_trait]
impl SubmissionGate for ApiClient {
    async fn applications_open(&self) -> Result<bool> {
        Ok(ApiClient::applications_open(self).await?.is_open)
    }
}

#[async_trait::async_trait]
impl UploadBroker for ApiClient {
    async fn authorize(
        &self,
        request: &AuthorizeUploadRequest,
    ) -> Result<UploadAuthorization, WorkflowError> {
        self.authorize_upload(request).await.map_err(|err| {
            tracing::warn!(error = %err, object_key = %request.object_key, "Upload authorization refused");
            match api_status(&err) {
                Some(status) if status.status == 415 => WorkflowError::UnsupportedType {
                    content_type: request.content_type.clone(),
                },
                Some(status) if status.status == 413 => WorkflowError::PayloadTooLarge {
                    size_bytes: request.size_bytes,
                    max_bytes: MAX_UPLOAD_SIZE_BYTES,
                },
                Some(status) => WorkflowError::AuthorizationDenied {
                    reason: status.message.clone(),
                },
                None => WorkflowError::AuthorizationDenied {
                    reason: err.to_string(),
                },
            }
        })
    }
}

#[async_trait::async_trait]
impl RecordCommitter for ApiClient {
    async fn attach_object(
        &self,
        application_id: Uuid,
        slot: FileSlot,
        object_key: &str,
    ) -> Result<StoredObjectReference> {
        ApiClient::attach_object(self, application_id, slot, object_key).await
    }

    async fn reset_review_status(
        &self,
        application_id: Uuid,
        update: ReviewStatusUpdate,
    ) -> Result<()> {
        self.update_status(application_id, update).await?;
        Ok(())
    }
}

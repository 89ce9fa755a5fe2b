use crate::auth::CallerContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use admissions_core::models::{AuthorizeUploadRequest, UploadAuthorization};
use axum::{extract::State, Json};
use std::sync::Arc;

/// Request a presigned URL for a direct upload
///
/// The URL is bound to the object key, content type, size and checksum in the request
/// and expires after a short window. The bytes go straight to storage; commit the key
/// with `PUT /api/v0/applications/{id}/files/{slot}` once the transfer succeeds.
#[utoipa::path(
    post,
    path = "/api/v0/uploads/authorize",
    tag = "uploads",
    request_body = AuthorizeUploadRequest,
    responses(
        (status = 200, description = "Upload authorized", body = UploadAuthorization),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Object key belongs to another owner", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 415, description = "Unsupported content type", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn authorize_upload(
    caller: CallerContext,
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<AuthorizeUploadRequest>,
) -> Result<Json<UploadAuthorization>, HttpAppError> {
    caller.require_applicant()?;
    Ok(Json(state.broker.authorize(caller.user_id, &request).await?))
}

//! Application records: draft creation, committed file references and review status.

use crate::auth::CallerContext;
use crate::error::{storage_error, ErrorResponse, HttpAppError, ValidatedJson};
use crate::services::reconcile_application;
use crate::state::AppState;
use admissions_core::models::{
    Application, ApplicationResponse, AttachObjectRequest, FileSlot, ReadAuthorization,
    ReconciliationReport, ReviewStatusUpdate, StoredObjectReference,
};
use admissions_core::{is_owned_by, object_key, AppError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

async fn load_application(state: &AppState, id: Uuid) -> Result<Application, AppError> {
    state
        .stores
        .applications
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {} not found", id)))
}

async fn application_response(
    state: &AppState,
    application: Application,
) -> Result<ApplicationResponse, AppError> {
    let files = state.stores.applications.list_files(application.id).await?;
    Ok(ApplicationResponse::new(application, files))
}

/// Create the caller's draft application, or return the existing one
///
/// New drafts can only be started while applications are open.
#[utoipa::path(
    post,
    path = "/api/v0/applications",
    tag = "applications",
    responses(
        (status = 201, description = "Draft created", body = ApplicationResponse),
        (status = 200, description = "Existing application", body = ApplicationResponse),
        (status = 403, description = "Applications are closed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state),
    fields(user_id = %caller.user_id, operation = "create_application")
)]
pub async fn create_application(
    caller: CallerContext,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    caller.require_applicant()?;

    if let Some(existing) = state
        .stores
        .applications
        .get_by_owner(caller.user_id)
        .await?
    {
        let response = application_response(&state, existing).await?;
        return Ok((StatusCode::OK, Json(response)));
    }

    if !state.stores.settings.applications_open().await?.is_open {
        return Err(AppError::SubmissionsClosed.into());
    }

    let application = state
        .stores
        .applications
        .create_or_get_draft(caller.user_id)
        .await?;

    tracing::info!(application_id = %application.id, "Draft application created");

    let response = application_response(&state, application).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get the caller's own application
#[utoipa::path(
    get,
    path = "/api/v0/applications/me",
    tag = "applications",
    responses(
        (status = 200, description = "Application", body = ApplicationResponse),
        (status = 404, description = "No application yet", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_my_application(
    caller: CallerContext,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApplicationResponse>, HttpAppError> {
    caller.require_applicant()?;

    let application = state
        .stores
        .applications
        .get_by_owner(caller.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No application for this account".to_string()))?;

    Ok(Json(application_response(&state, application).await?))
}

/// Get an application by ID
#[utoipa::path(
    get,
    path = "/api/v0/applications/{id}",
    tag = "applications",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Application", body = ApplicationResponse),
        (status = 404, description = "Application not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_application(
    caller: CallerContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationResponse>, HttpAppError> {
    let application = load_application(&state, id).await?;
    caller.require_read_access(&application)?;

    Ok(Json(application_response(&state, application).await?))
}

/// Attach an uploaded object to a slot
///
/// The key must be the slot's deterministic key and the object must already be in
/// storage. A repeated attach replaces the slot's reference.
#[utoipa::path(
    put,
    path = "/api/v0/applications/{id}/files/{slot}",
    tag = "applications",
    params(
        ("id" = Uuid, Path, description = "Application ID"),
        ("slot" = FileSlot, Path, description = "File slot")
    ),
    request_body = AttachObjectRequest,
    responses(
        (status = 200, description = "Reference committed", body = StoredObjectReference),
        (status = 400, description = "Key does not match the slot", body = ErrorResponse),
        (status = 403, description = "Key belongs to another owner", body = ErrorResponse),
        (status = 404, description = "Application or object not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, request),
    fields(
        user_id = %caller.user_id,
        application_id = %id,
        slot = %slot,
        operation = "attach_object"
    )
)]
pub async fn attach_object(
    caller: CallerContext,
    State(state): State<Arc<AppState>>,
    Path((id, slot)): Path<(Uuid, FileSlot)>,
    ValidatedJson(request): ValidatedJson<AttachObjectRequest>,
) -> Result<Json<StoredObjectReference>, HttpAppError> {
    request.validate()?;

    let application = load_application(&state, id).await?;
    caller.require_owner(&application)?;

    if !is_owned_by(&request.object_key, application.owner_id) {
        return Err(AppError::Forbidden(
            "Object key does not belong to this application".to_string(),
        )
        .into());
    }
    if request.object_key != object_key(application.owner_id, slot) {
        return Err(AppError::InvalidInput(format!(
            "Object key does not match slot {}",
            slot
        ))
        .into());
    }

    let exists = state
        .storage
        .exists(&request.object_key)
        .await
        .map_err(storage_error)?;
    if !exists {
        return Err(AppError::NotFound(format!(
            "Object {} has not been uploaded",
            request.object_key
        ))
        .into());
    }

    let reference = state
        .stores
        .applications
        .attach_object(id, slot, &request.object_key)
        .await?;

    Ok(Json(reference))
}

/// Get a time-limited read URL for a committed file
#[utoipa::path(
    get,
    path = "/api/v0/applications/{id}/files/{slot}/read-url",
    tag = "applications",
    params(
        ("id" = Uuid, Path, description = "Application ID"),
        ("slot" = FileSlot, Path, description = "File slot")
    ),
    responses(
        (status = 200, description = "Read authorization", body = ReadAuthorization),
        (status = 404, description = "No committed file in this slot", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state),
    fields(user_id = %caller.user_id, application_id = %id, slot = %slot, operation = "read_url")
)]
pub async fn get_read_url(
    caller: CallerContext,
    State(state): State<Arc<AppState>>,
    Path((id, slot)): Path<(Uuid, FileSlot)>,
) -> Result<Json<ReadAuthorization>, HttpAppError> {
    let application = load_application(&state, id).await?;
    caller.require_read_access(&application)?;

    let files = state.stores.applications.list_files(id).await?;
    let reference = files
        .into_iter()
        .find(|f| f.slot == slot)
        .ok_or_else(|| AppError::NotFound(format!("No file committed for slot {}", slot)))?;

    Ok(Json(state.broker.authorize_read(&reference.object_key).await?))
}

/// Set `status` or `report_status`
///
/// Reviewers may set any value. Applicants may only put their report back to
/// `PENDING` after replacing it.
#[utoipa::path(
    patch,
    path = "/api/v0/applications/{id}/status",
    tag = "applications",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = ReviewStatusUpdate,
    responses(
        (status = 200, description = "Status updated", body = ApplicationResponse),
        (status = 403, description = "Not allowed to set this value", body = ErrorResponse),
        (status = 404, description = "Application not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state),
    fields(user_id = %caller.user_id, application_id = %id, operation = "update_status")
)]
pub async fn update_status(
    caller: CallerContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(update): ValidatedJson<ReviewStatusUpdate>,
) -> Result<Json<ApplicationResponse>, HttpAppError> {
    let application = load_application(&state, id).await?;

    if !caller.is_reviewer() {
        caller.require_owner(&application)?;
        if !update.is_report_reset() {
            return Err(AppError::Forbidden(
                "Applicants can only reset the report status to PENDING".to_string(),
            )
            .into());
        }
    }

    let application = state
        .stores
        .applications
        .apply_status_update(id, update)
        .await?;

    tracing::info!(
        field = update.field_name(),
        status = ?application.status,
        report_status = ?application.report_status,
        "Review status updated"
    );

    Ok(Json(application_response(&state, application).await?))
}

/// Compare storage with committed references for an application
#[utoipa::path(
    get,
    path = "/api/v0/applications/{id}/reconciliation",
    tag = "applications",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Reconciliation report", body = ReconciliationReport),
        (status = 403, description = "Reviewers only", body = ErrorResponse),
        (status = 404, description = "Application not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn reconcile(
    caller: CallerContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReconciliationReport>, HttpAppError> {
    caller.require_reviewer()?;

    let application = load_application(&state, id).await?;
    let files = state.stores.applications.list_files(id).await?;
    let report = reconcile_application(state.storage.as_ref(), &application, &files).await?;

    Ok(Json(report))
}

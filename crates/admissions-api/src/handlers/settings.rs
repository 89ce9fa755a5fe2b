use crate::auth::CallerContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use admissions_core::models::ApplicationsOpen;
use axum::{extract::State, Json};
use std::sync::Arc;

/// Whether applications are currently open
///
/// Public. Clients treat any failure of this endpoint as closed.
#[utoipa::path(
    get,
    path = "/api/v0/settings/applications-open",
    tag = "settings",
    responses(
        (status = 200, description = "Gate value", body = ApplicationsOpen),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_applications_open(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApplicationsOpen>, HttpAppError> {
    Ok(Json(state.stores.settings.applications_open().await?))
}

/// Open or close applications
#[utoipa::path(
    put,
    path = "/api/v0/settings/applications-open",
    tag = "settings",
    request_body = ApplicationsOpen,
    responses(
        (status = 200, description = "Gate updated", body = ApplicationsOpen),
        (status = 403, description = "Reviewers only", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, body),
    fields(user_id = %caller.user_id, is_open = body.is_open, operation = "set_applications_open")
)]
pub async fn set_applications_open(
    caller: CallerContext,
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<ApplicationsOpen>,
) -> Result<Json<ApplicationsOpen>, HttpAppError> {
    caller.require_reviewer()?;
    Ok(Json(
        state
            .stores
            .settings
            .set_applications_open(body.is_open)
            .await?,
    ))
}

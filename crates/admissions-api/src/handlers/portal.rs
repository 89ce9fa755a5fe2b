use crate::auth::CallerContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use admissions_core::{select_status_content, StatusContent, StatusInputs};
use axum::{extract::State, Json};
use std::sync::Arc;

/// Status banner for the caller's dashboard
#[utoipa::path(
    get,
    path = "/api/v0/portal/status",
    tag = "portal",
    responses(
        (status = 200, description = "Banner content", body = StatusContent),
        (status = 403, description = "Applicants only", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn portal_status(
    caller: CallerContext,
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusContent>, HttpAppError> {
    caller.require_applicant()?;

    // Same rule as the submission client: an unreadable gate is a closed gate
    let applications_open = match state.stores.settings.applications_open().await {
        Ok(value) => value.is_open,
        Err(e) => {
            tracing::warn!(error = %e, "Could not read applications gate, treating as closed");
            false
        }
    };

    let application = state
        .stores
        .applications
        .get_by_owner(caller.user_id)
        .await?;

    let inputs = StatusInputs {
        has_application: application.is_some(),
        application_status: application.as_ref().map(|a| a.status),
        report_status: application.as_ref().and_then(|a| a.report_status),
        applications_open,
    };

    Ok(Json(select_status_content(inputs)))
}

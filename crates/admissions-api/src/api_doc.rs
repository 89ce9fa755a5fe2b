//! OpenAPI documentation, served at `/api/openapi.json` and rendered under `/docs`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::auth::Role;
use crate::error;
use crate::handlers;
use admissions_core::{display, models};

/// Returns the OpenAPI spec
pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Admissions Portal API",
        version = "0.1.0",
        description = "Applications, document uploads and review status for the admissions portal (v0). Documents are uploaded directly to object storage with presigned URLs and then committed to the application record. All endpoints are versioned under /api/v0/."
    ),
    paths(
        // Settings
        handlers::settings::get_applications_open,
        handlers::settings::set_applications_open,
        // Applications
        handlers::applications::create_application,
        handlers::applications::get_my_application,
        handlers::applications::get_application,
        handlers::applications::attach_object,
        handlers::applications::get_read_url,
        handlers::applications::update_status,
        handlers::applications::reconcile,
        // Uploads
        handlers::uploads::authorize_upload,
        // Portal
        handlers::portal::portal_status,
    ),
    components(schemas(
        error::ErrorResponse,
        Role,
        models::ApplicationStatus,
        models::ReportStatus,
        models::FileSlot,
        models::StoredObjectReference,
        models::ApplicationResponse,
        models::AttachObjectRequest,
        models::ReviewStatusUpdate,
        models::ApplicationsOpen,
        models::AuthorizeUploadRequest,
        models::UploadAuthorization,
        models::ReadAuthorization,
        models::OrphanedObject,
        models::ReconciliationReport,
        display::StatusContent,
        display::Tone,
        display::StatusAction,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "settings", description = "Portal-wide settings"),
        (name = "applications", description = "Application records and committed documents"),
        (name = "uploads", description = "Presigned upload authorization"),
        (name = "portal", description = "Applicant dashboard content")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_upload_and_commit_paths() {
        let spec = get_openapi_spec();
        assert!(spec.paths.paths.contains_key("/api/v0/uploads/authorize"));
        assert!(spec
            .paths
            .paths
            .contains_key("/api/v0/applications/{id}/files/{slot}"));
        let components = spec.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}

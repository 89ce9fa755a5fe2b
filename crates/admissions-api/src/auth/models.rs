use crate::error::ErrorResponse;
use admissions_core::models::Application;
use admissions_core::AppError;
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;

/// Caller role for authorization
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Applicant,
    Reviewer,
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Role::Applicant => write!(f, "applicant"),
            Role::Reviewer => write!(f, "reviewer"),
        }
    }
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: Uuid, // user id; applicants own the application keyed by it
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

/// Identity extracted from the bearer token and stored in request extensions
#[derive(Debug, Clone)]
pub struct CallerContext {
    pub user_id: Uuid,
    pub role: Role,
}

impl From<JwtClaims> for CallerContext {
    fn from(claims: JwtClaims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
        }
    }
}

impl CallerContext {
    pub fn is_reviewer(&self) -> bool {
        self.role == Role::Reviewer
    }

    pub fn require_applicant(&self) -> Result<(), AppError> {
        match self.role {
            Role::Applicant => Ok(()),
            Role::Reviewer => Err(AppError::Forbidden(
                "This operation is only available to applicants".to_string(),
            )),
        }
    }

    pub fn require_reviewer(&self) -> Result<(), AppError> {
        match self.role {
            Role::Reviewer => Ok(()),
            Role::Applicant => Err(AppError::Forbidden(
                "This operation is only available to reviewers".to_string(),
            )),
        }
    }

    pub fn owns(&self, application: &Application) -> bool {
        self.role == Role::Applicant && application.owner_id == self.user_id
    }

    /// Owners and reviewers may read an application.
    pub fn require_read_access(&self, application: &Application) -> Result<(), AppError> {
        if self.owns(application) || self.is_reviewer() {
            Ok(())
        } else {
            Err(not_visible(application))
        }
    }

    pub fn require_owner(&self, application: &Application) -> Result<(), AppError> {
        if self.owns(application) {
            Ok(())
        } else if self.is_reviewer() {
            Err(AppError::Forbidden(
                "Only the applicant can change their documents".to_string(),
            ))
        } else {
            Err(not_visible(application))
        }
    }
}

// Other applicants' applications are reported as missing rather than forbidden
fn not_visible(application: &Application) -> AppError {
    AppError::NotFound(format!("Application {} not found", application.id))
}

// Extract directly from request parts so handlers can take it as a plain argument
impl<S> FromRequestParts<S> for CallerContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerContext>()
            .cloned()
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse {
                        error: "Missing caller context".to_string(),
                        details: None,
                        error_type: None,
                        code: "MISSING_CALLER_CONTEXT".to_string(),
                        recoverable: false,
                        suggested_action: Some("Check authentication token".to_string()),
                    }),
                )
            })
    }
}

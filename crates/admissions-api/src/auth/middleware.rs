use crate::auth::jwt::TokenVerifier;
use crate::auth::models::CallerContext;
use crate::error::HttpAppError;
use admissions_core::AppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthState {
    pub verifier: TokenVerifier,
}

impl AuthState {
    pub fn new(jwt_secret: &str) -> Self {
        Self {
            verifier: TokenVerifier::new(jwt_secret),
        }
    }
}

pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = match request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
    {
        Some(h) => h,
        None => {
            return HttpAppError(AppError::Unauthorized(
                "Missing authorization header".to_string(),
            ))
            .into_response();
        }
    };

    let Some(token) = auth_header.strip_prefix("Bearer ") else {
        return HttpAppError(AppError::Unauthorized(
            "Invalid authorization header format".to_string(),
        ))
        .into_response();
    };

    let claims = match auth_state.verifier.verify(token.trim()) {
        Ok(claims) => claims,
        Err(err) => return HttpAppError(err).into_response(),
    };

    tracing::debug!(user_id = %claims.sub, role = %claims.role, "Request authenticated");

    request
        .extensions_mut()
        .insert(CallerContext::from(claims));
    next.run(request).await
}

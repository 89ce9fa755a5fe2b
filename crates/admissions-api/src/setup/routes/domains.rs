//! Domain route groups (settings, applications, uploads, portal, local objects).

use crate::constants::API_PREFIX;
use crate::handlers;
use crate::state::AppState;
use admissions_storage::LOCAL_OBJECTS_ROUTE;
use axum::routing::{get, patch, post, put};
use axum::Router;
use std::sync::Arc;

pub fn settings_public_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/settings/applications-open", API_PREFIX),
            get(handlers::settings::get_applications_open),
        )
        .with_state(state)
}

pub fn settings_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/settings/applications-open", API_PREFIX),
            put(handlers::settings::set_applications_open),
        )
        .with_state(state)
}

pub fn application_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/applications", API_PREFIX),
            post(handlers::applications::create_application),
        )
        .route(
            &format!("{}/applications/me", API_PREFIX),
            get(handlers::applications::get_my_application),
        )
        .route(
            &format!("{}/applications/{{id}}", API_PREFIX),
            get(handlers::applications::get_application),
        )
        .route(
            &format!("{}/applications/{{id}}/files/{{slot}}", API_PREFIX),
            put(handlers::applications::attach_object),
        )
        .route(
            &format!("{}/applications/{{id}}/files/{{slot}}/read-url", API_PREFIX),
            get(handlers::applications::get_read_url),
        )
        .route(
            &format!("{}/applications/{{id}}/status", API_PREFIX),
            patch(handlers::applications::update_status),
        )
        .route(
            &format!("{}/applications/{{id}}/reconciliation", API_PREFIX),
            get(handlers::applications::reconcile),
        )
        .with_state(state)
}

pub fn upload_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/uploads/authorize", API_PREFIX),
            post(handlers::uploads::authorize_upload),
        )
        .with_state(state)
}

pub fn portal_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/portal/status", API_PREFIX),
            get(handlers::portal::portal_status),
        )
        .with_state(state)
}

/// Presigned targets for the local backend. Authorized by URL signature, not bearer token.
pub fn local_object_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/{{*key}}", LOCAL_OBJECTS_ROUTE),
            put(handlers::local_objects::put_local_object)
                .get(handlers::local_objects::get_local_object),
        )
        .with_state(state)
}

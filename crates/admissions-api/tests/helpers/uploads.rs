//! Two-phase upload steps driven through the router.

use super::{api_path, TEST_BASE_URL};
use super::auth::TestUser;
use admissions_core::models::{
    ApplicationResponse, FileSlot, StoredObjectReference, UploadAuthorization,
};
use admissions_core::{compute, object_key};
use admissions_storage::parse_signed_query;
use axum::http::StatusCode;
use axum_test::{TestResponse, TestServer};
use bytes::Bytes;
use serde_json::json;

pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n% test document\n%%EOF\n";

pub async fn create_application(server: &TestServer, user: &TestUser) -> ApplicationResponse {
    let response = server
        .post(&api_path("/applications"))
        .add_header("Authorization", user.bearer())
        .await;
    assert!(
        response.status_code() == StatusCode::CREATED || response.status_code() == StatusCode::OK,
        "unexpected status {}",
        response.status_code()
    );
    response.json::<ApplicationResponse>()
}

pub async fn request_authorization(
    server: &TestServer,
    user: &TestUser,
    slot: FileSlot,
    content_type: &str,
    body: &[u8],
) -> TestResponse {
    server
        .post(&api_path("/uploads/authorize"))
        .add_header("Authorization", user.bearer())
        .json(&json!({
            "object_key": object_key(user.user_id, slot),
            "content_type": content_type,
            "size_bytes": body.len(),
            "integrity_token": compute(body).to_string(),
        }))
        .await
}

/// Path of a locally signed URL, relative to the router
pub fn local_path(target_url: &str) -> (String, String) {
    let rest = target_url
        .strip_prefix(TEST_BASE_URL)
        .expect("target URL points at the test base URL");
    let (path, query) = rest.split_once('?').expect("signed URL has a query");
    (path.to_string(), query.to_string())
}

/// PUT `body` to the authorization's target the way a client would
pub async fn put_signed(
    server: &TestServer,
    authorization: &UploadAuthorization,
    body: &[u8],
) -> TestResponse {
    let (path, query) = local_path(&authorization.target_url);
    let signed = parse_signed_query(&query).expect("signed query");

    let mut request = server
        .put(&path)
        .add_query_param("expires", signed.expires)
        .add_query_param("sig", &signed.signature);
    for (name, value) in &authorization.required_headers {
        request = request.add_header(name.clone(), value.clone());
    }
    request.bytes(Bytes::copy_from_slice(body)).await
}

pub async fn commit(
    server: &TestServer,
    user: &TestUser,
    application: &ApplicationResponse,
    slot: FileSlot,
    key: &str,
) -> TestResponse {
    server
        .put(&api_path(&format!("/applications/{}/files/{}", application.id, slot)))
        .add_header("Authorization", user.bearer())
        .json(&json!({ "object_key": key }))
        .await
}

/// Authorize, upload and commit one document; returns the committed reference.
pub async fn upload_and_commit(
    server: &TestServer,
    user: &TestUser,
    application: &ApplicationResponse,
    slot: FileSlot,
    body: &[u8],
) -> StoredObjectReference {
    let response = request_authorization(server, user, slot, "application/pdf", body).await;
    response.assert_status_ok();
    let authorization = response.json::<UploadAuthorization>();

    put_signed(server, &authorization, body).await.assert_status_ok();

    let response = commit(server, user, application, slot, &authorization.object_key).await;
    response.assert_status_ok();
    response.json::<StoredObjectReference>()
}

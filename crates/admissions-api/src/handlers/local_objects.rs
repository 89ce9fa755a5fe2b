//! Target of presigned URLs issued by the local storage backend.
//!
//! Plays the part S3 plays for real buckets: it trusts nothing but the URL signature,
//! and a PUT is only stored when the headers and body match what was signed.

use crate::error::HttpAppError;
use crate::state::AppState;
use admissions_core::constants::CHECKSUM_HEADER;
use admissions_core::AppError;
use admissions_storage::{parse_signed_query, LocalStorage, SignedQuery};
use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;

fn local_backend(state: &AppState) -> Result<&LocalStorage, AppError> {
    state
        .local_storage
        .as_deref()
        .ok_or_else(|| AppError::NotFound("Local object storage is not enabled".to_string()))
}

fn signed_query(query: Option<String>) -> Result<SignedQuery, AppError> {
    query
        .as_deref()
        .and_then(parse_signed_query)
        .ok_or_else(|| AppError::Forbidden("Missing request signature".to_string()))
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tracing::instrument(skip(state, query, headers, body), fields(key = %key, size_bytes = body.len()))]
pub async fn put_local_object(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, HttpAppError> {
    let storage = local_backend(&state)?;
    let query = signed_query(query)?;

    storage
        .accept_signed_put(
            &key,
            &query,
            header_value(&headers, header::CONTENT_TYPE.as_str()),
            header_value(&headers, CHECKSUM_HEADER),
            &body,
        )
        .await?;

    Ok(StatusCode::OK)
}

#[tracing::instrument(skip(state, query), fields(key = %key))]
pub async fn get_local_object(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<impl IntoResponse, HttpAppError> {
    let storage = local_backend(&state)?;
    let query = signed_query(query)?;

    let bytes = storage.read_signed(&key, &query).await?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        bytes,
    ))
}

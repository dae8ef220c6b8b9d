//! Storage routes — `images/*` objects for signed-in users.
//!
//! Every request goes through `StorageKey::parse` first. Reads are handed to
//! `ServeFile`, which streams the file and sets content type and 404.

use axum::body::{Body, Bytes};
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::routes::auth::AuthUser;
use crate::services::storage::{StorageError, StorageKey};
use crate::state::AppState;

pub(crate) fn storage_error_to_status(err: &StorageError) -> StatusCode {
    match err {
        StorageError::InvalidKey(_) => StatusCode::BAD_REQUEST,
        StorageError::Forbidden(_) => StatusCode::FORBIDDEN,
        StorageError::NotFound(_) => StatusCode::NOT_FOUND,
        StorageError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &StorageError) -> Response {
    let status = storage_error_to_status(err);
    if status.is_server_error() {
        tracing::error!(error = %err, "storage request failed");
    }
    (status, err.to_string()).into_response()
}

/// `GET /api/storage/{*key}`
pub async fn get_object(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(key): Path<String>,
    req: Request<Body>,
) -> Response {
    let key = match StorageKey::parse(&key) {
        Ok(k) => k,
        Err(e) => return error_response(&e),
    };
    match ServeFile::new(state.storage.path_for(&key)).oneshot(req).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

/// `PUT /api/storage/{*key}` — raw body, overwrites.
pub async fn put_object(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(key): Path<String>,
    body: Bytes,
) -> Response {
    let key = match StorageKey::parse(&key) {
        Ok(k) => k,
        Err(e) => return error_response(&e),
    };
    match state.storage.write(&key, &body).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(&e),
    }
}

/// `DELETE /api/storage/{*key}`
pub async fn delete_object(State(state): State<AppState>, _auth: AuthUser, Path(key): Path<String>) -> Response {
    let key = match StorageKey::parse(&key) {
        Ok(k) => k,
        Err(e) => return error_response(&e),
    };
    match state.storage.delete(&key).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(&e),
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;

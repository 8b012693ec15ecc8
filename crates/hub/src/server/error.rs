//! Error responses shared by every handler.
//!
//! Store failures are translated to HTTP statuses in one place,
//! [`api_store_error`], so handlers never pick status codes for them.
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::db::StoreError;

use super::api_types::ErrorResponse;

/// HTTP status plus an optional JSON error body.
#[derive(Debug)]
pub(super) struct ApiError {
    pub(super) status: StatusCode,
    pub(super) body: Option<ErrorResponse>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self.body {
            Some(body) => (self.status, Json(body)).into_response(),
            None => self.status.into_response(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        api_validation_error(&rejection.body_text())
    }
}

fn api_error(status: StatusCode, code: &str, message: &str) -> ApiError {
    ApiError {
        status,
        body: Some(ErrorResponse {
            code: code.to_string(),
            message: message.to_string(),
        }),
    }
}

pub(super) fn api_not_found(message: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, "not_found", message)
}

pub(super) fn api_conflict(message: &str) -> ApiError {
    api_error(StatusCode::CONFLICT, "conflict", message)
}

pub(super) fn api_validation_error(message: &str) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "validation_error", message)
}

/// 400 with no body, for query parameters that fail to parse.
pub(super) fn api_bad_query() -> ApiError {
    ApiError {
        status: StatusCode::BAD_REQUEST,
        body: None,
    }
}

pub(super) fn api_unauthorized(message: &str) -> ApiError {
    api_error(StatusCode::UNAUTHORIZED, "unauthorized", message)
}

pub(super) fn api_forbidden(message: &str) -> ApiError {
    api_error(StatusCode::FORBIDDEN, "forbidden", message)
}

pub(super) fn api_internal_message(message: &str) -> ApiError {
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

/// Maps a store failure on `resource` to a response. Internal details are logged, not returned.
pub(super) fn api_store_error(resource: &str, err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound(_) => api_not_found(&format!("{resource} not found")),
        StoreError::Conflict(detail) => api_conflict(&format!("{resource} conflict: {detail}")),
        StoreError::Unexpected(error) => {
            tracing::error!(error = ?error, resource, "storage error");
            api_internal_message(&format!("{resource} storage failure"))
        }
    }
}

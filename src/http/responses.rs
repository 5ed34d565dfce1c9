// JSON envelope shared by every endpoint, and the mapping from domain errors
// to HTTP status codes.
//
// Success: `{ "success": true, "data": ... }`
// Failure: `{ "success": false, "error": "...", "code": "..." }`

use crate::core::confessions::ConfessionError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct SuccessBody<T> {
    success: bool,
    data: T,
}

/// A successful response with `data` and the given status.
pub fn success<T: Serialize>(status: StatusCode, data: T) -> Response {
    (
        status,
        Json(SuccessBody {
            success: true,
            data,
        }),
    )
        .into_response()
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    code: &'static str,
}

/// An error ready to be sent to the client.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "validation",
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                success: false,
                error: self.message,
                code: self.code,
            }),
        )
            .into_response()
    }
}

impl From<ConfessionError> for ApiError {
    fn from(err: ConfessionError) -> Self {
        let status = match &err {
            ConfessionError::Validation(_) | ConfessionError::Rejected(_) => {
                StatusCode::BAD_REQUEST
            }
            ConfessionError::NotFound(_) => StatusCode::NOT_FOUND,
            ConfessionError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Storage details stay in the logs.
        let message = match &err {
            ConfessionError::StorageError(detail) => {
                tracing::error!(error = %detail, "Storage error while handling request");
                "Internal storage error".to_string()
            }
            ConfessionError::NotFound(_) => "Confession not found".to_string(),
            other => other.to_string(),
        };

        Self {
            status,
            code: err.code(),
            message,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

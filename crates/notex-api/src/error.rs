//! HTTP error responses.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Message returned for every missing-note response.
pub const NOTE_NOT_FOUND: &str = "Note not found";

/// Generic message for unexpected failures without operation context.
pub const INTERNAL_ERROR: &str = "Internal server error";

/// Error returned by every handler.
///
/// Renders as `{"error": ...}` plus an optional `details` field for 500s.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    PayloadTooLarge(String),
    Internal {
        message: String,
        details: Option<String>,
    },
}

impl ApiError {
    /// Convert a core error, reporting `failure` as the 500 message.
    pub fn context(err: notex_core::Error, failure: &str) -> Self {
        match Self::from(err) {
            ApiError::Internal { details, .. } => ApiError::Internal {
                message: failure.to_string(),
                details,
            },
            other => other,
        }
    }

    /// Like [`ApiError::context`], but also exposes the lower-level error
    /// message in `details`.
    pub fn context_with_details(err: notex_core::Error, failure: &str) -> Self {
        let cause = err.to_string();
        match Self::context(err, failure) {
            ApiError::Internal { message, .. } => ApiError::Internal {
                message,
                details: Some(cause),
            },
            other => other,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<notex_core::Error> for ApiError {
    fn from(err: notex_core::Error) -> Self {
        match err {
            notex_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            notex_core::Error::NoteNotFound(_) => ApiError::NotFound(NOTE_NOT_FOUND.to_string()),
            other => {
                tracing::error!(
                    subsystem = "api",
                    component = "error",
                    error = %other,
                    "Request failed"
                );
                ApiError::Internal {
                    message: INTERNAL_ERROR.to_string(),
                    details: None,
                }
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // Streamed bodies only hit the size limit while being buffered here.
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge(rejection.body_text());
        }
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(_: PathRejection) -> Self {
        ApiError::BadRequest("Invalid note id".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::PayloadTooLarge(msg) => {
                serde_json::json!({ "error": msg })
            }
            ApiError::Internal {
                message,
                details: Some(details),
            } => serde_json::json!({ "error": message, "details": details }),
            ApiError::Internal { message, .. } => serde_json::json!({ "error": message }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notex_core::Error;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_invalid_input_is_400() {
        let resp = ApiError::from(Error::InvalidInput("Name is required".into())).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], "Name is required");
    }

    #[tokio::test]
    async fn test_not_found_is_404_with_fixed_message() {
        let resp = ApiError::from(Error::NoteNotFound(999)).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(resp).await,
            serde_json::json!({ "error": "Note not found" })
        );
    }

    #[tokio::test]
    async fn test_internal_error_hides_cause_by_default() {
        let resp = ApiError::context(Error::Database(sqlx::Error::PoolTimedOut), "Failed to update note")
            .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(resp).await;
        assert_eq!(body["error"], "Failed to update note");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_create_failure_carries_details() {
        let resp = ApiError::context_with_details(
            Error::Database(sqlx::Error::PoolTimedOut),
            "Failed to create note",
        )
        .into_response();
        let body = body_json(resp).await;
        assert_eq!(body["error"], "Failed to create note");
        let details = body["details"].as_str().unwrap();
        assert!(details.starts_with("Database error:"), "{details}");
    }

    #[tokio::test]
    async fn test_payload_too_large_is_413() {
        let resp = ApiError::PayloadTooLarge("Failed to buffer the request body".into()).into_response();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body_json(resp).await["error"], "Failed to buffer the request body");
    }

    #[test]
    fn test_context_keeps_client_errors() {
        let err = ApiError::context_with_details(Error::NoteNotFound(1), "Failed to create note");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        let err = ApiError::context(Error::InvalidInput("bad".into()), "Failed");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}

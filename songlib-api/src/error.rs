//! Error types for songlib-api
//!
//! Handlers return [`ApiResult`]; every failure is logged here, once, and
//! turned into a status code with a generic message. Underlying causes stay
//! in the log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::enrichment::EnrichmentError;

pub type ApiResult<T> = Result<T, ApiError>;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed body, path or query (400)
    #[error("Bad input: {0}")]
    BadInput(String),

    /// No song with the requested id (404)
    #[error("Song {0} not found")]
    NotFound(i64),

    /// Enrichment call failed or returned a non-success status (500)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Enrichment response could not be decoded (500)
    #[error("Decode error: {0}")]
    Decode(String),

    /// Database failure (500)
    #[error("Store error: {0}")]
    Store(String),

    /// Anything else (500)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<EnrichmentError> for ApiError {
    fn from(err: EnrichmentError) -> Self {
        match err {
            EnrichmentError::Upstream(msg) => ApiError::Upstream(msg),
            EnrichmentError::Decode(msg) => ApiError::Decode(msg),
        }
    }
}

impl From<songlib_common::Error> for ApiError {
    fn from(err: songlib_common::Error) -> Self {
        match err {
            songlib_common::Error::Database(e) => ApiError::Store(e.to_string()),
            songlib_common::Error::InvalidInput(msg) => ApiError::BadInput(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::BadInput(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::NotFound(id) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", format!("Song {} not found", id))
            }
            ApiError::Upstream(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "UPSTREAM_ERROR",
                "Failed to get song details".to_string(),
            ),
            ApiError::Decode(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DECODE_ERROR",
                "Failed to decode external API response".to_string(),
            ),
            ApiError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "Failed to access song storage".to_string(),
            ),
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = self.parts();

        if status.is_server_error() {
            error!(code = error_code, "{}", self);
        } else {
            warn!(code = error_code, "{}", self);
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::BadInput("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::NotFound(1), StatusCode::NOT_FOUND),
            (ApiError::Upstream("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::Decode("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::Store("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_server_errors_hide_cause() {
        let (_, code, message) =
            ApiError::Store("password authentication failed for user".into()).parts();
        assert_eq!(code, "STORE_ERROR");
        assert!(!message.contains("password"));
    }

    #[test]
    fn test_enrichment_errors_keep_their_kind() {
        assert!(matches!(
            ApiError::from(EnrichmentError::Decode("eof".into())),
            ApiError::Decode(_)
        ));
        assert!(matches!(
            ApiError::from(EnrichmentError::Upstream("503".into())),
            ApiError::Upstream(_)
        ));
    }

    #[test]
    fn test_invalid_input_maps_to_bad_input() {
        let err = songlib_common::Error::InvalidInput("field 'group' must not be empty".into());
        assert!(matches!(ApiError::from(err), ApiError::BadInput(_)));
    }
}

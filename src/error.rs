//! Error taxonomy and the error-to-response mapper.

use serde::Serialize;
use thiserror::Error;

use crate::coins::StoreError;
use crate::http::parser::ProtocolError;
use crate::http::response::{Response, ResponseBuilder, StatusCode};

/// An error that already knows which status it should produce.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RoutingError {
    pub status: StatusCode,
    pub reason: String,
    pub message: String,
}

impl RoutingError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            reason: status.reason_phrase().to_string(),
            message: message.into(),
        }
    }

    pub fn no_route(path: &str) -> Self {
        Self::new(StatusCode::NotFound, format!("No route found for path: {}", path))
    }
}

/// Everything a handler (or the transport in front of it) can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Malformed request: {0}")]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid JSON payload: {0}")]
    BadPayload(String),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::BadPayload(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound(err.to_string()),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Protocol(ProtocolError::Timeout) => StatusCode::RequestTimeout,
            ApiError::Protocol(_) => StatusCode::BadRequest,
            ApiError::Routing(e) => e.status,
            ApiError::NotFound(_) => StatusCode::NotFound,
            ApiError::BadPayload(_) => StatusCode::BadRequest,
            ApiError::Unexpected(_) => StatusCode::InternalServerError,
        }
    }

    fn reason(&self) -> String {
        match self {
            ApiError::Routing(e) => e.reason.clone(),
            other => other.status().reason_phrase().to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    status: u16,
}

/// Renders an error as `{"error": ..., "status": ...}`.
///
/// 500-class errors are logged here with full detail. Their message only
/// reaches the client when `expose_details` is set.
pub fn error_response(err: &ApiError, expose_details: bool) -> Response {
    let status = err.status();

    let message = if status.is_server_error() {
        tracing::error!(error = ?err, "Unhandled error while serving request");
        if expose_details {
            format!("Internal server error: {:#}", err)
        } else {
            status.reason_phrase().to_string()
        }
    } else {
        tracing::debug!(status = status.as_u16(), error = %err, "Request failed");
        err.to_string()
    };

    let body = ErrorBody {
        error: &message,
        status: status.as_u16(),
    };
    // Serializing two plain fields cannot fail; fall back to an empty object anyway.
    let body = serde_json::to_vec(&body).unwrap_or_else(|_| b"{}".to_vec());

    ResponseBuilder::new(status)
        .reason(err.reason())
        .header("Content-Type", "application/json")
        .body(body)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_error_keeps_its_reason() {
        let err = ApiError::from(RoutingError {
            status: StatusCode::MethodNotAllowed,
            reason: "Nope".to_string(),
            message: "wrong verb".to_string(),
        });
        let response = error_response(&err, true);

        assert_eq!(response.status, StatusCode::MethodNotAllowed);
        assert_eq!(response.reason, "Nope");
    }
}

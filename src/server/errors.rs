//! Relay error types and their HTTP rendering.
//!
//! Errors are returned to clients as `{"detail": "<message>"}`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::model::errors::CallError;

/// Errors surfaced by the relay routes.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The model call itself failed.
    #[error(transparent)]
    Upstream(#[from] CallError),

    /// The endpoint answered 2xx but not with a usable completion envelope.
    #[error("malformed completion envelope: {0}")]
    MalformedEnvelope(String),

    /// The client's request body could not be read as the expected JSON.
    #[error("{detail}")]
    InvalidRequest { status: StatusCode, detail: String },
}

impl From<JsonRejection> for RelayError {
    fn from(rejection: JsonRejection) -> Self {
        RelayError::InvalidRequest {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Upstream(e) => e.status_code(),
            RelayError::MalformedEnvelope(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::InvalidRequest { status, .. } => *status,
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

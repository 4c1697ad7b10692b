//! Model call error types.
//!
//! Every variant maps to the HTTP status the relay answers with; callers
//! are expected to log before translating.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur while calling the model endpoint.
#[derive(Debug, Error)]
pub enum CallError {
    /// No API key was configured. Raised before any network activity.
    #[error("API key not found")]
    MissingCredential,

    /// Every attempt failed to connect to the endpoint.
    #[error(
        "cannot connect to model endpoint {endpoint} after {attempts} attempt(s): {reason}. \
         Check network connectivity and model configuration"
    )]
    Unavailable {
        endpoint: String,
        attempts: u32,
        reason: String,
    },

    /// Non-2xx status, timeout, or another transport-level failure.
    #[error("model API request error: {reason}")]
    Http {
        status: Option<u16>,
        reason: String,
    },

    /// Anything else, e.g. an undecodable response body.
    #[error("model API call error: {reason}")]
    Unexpected { reason: String },
}

impl CallError {
    /// HTTP status the relay should answer with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CallError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            CallError::MissingCredential
            | CallError::Http { .. }
            | CallError::Unexpected { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Upstream status code, if this is an `Http` error caused by one.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            CallError::Http { status, .. } => *status,
            _ => None,
        }
    }
}

/// Render an error together with its source chain.
///
/// reqwest's top-level message ("error sending request") hides the actual
/// cause (refused, DNS, TLS) in its sources.
pub(crate) fn error_chain<E>(err: E) -> String
where
    E: std::error::Error + Send + Sync + 'static,
{
    format!("{:#}", anyhow::Error::new(err))
}

//! Consultation relay API.
//!
//! Routes:
//! - GET /
//! - POST /api/translation (diagnosis prompt)
//! - POST /api (diagnosis or questionnaire prompt, chosen from the text)

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::model::caller::CompletionBackend;
use crate::model::types::{ChatMessage, CompletionEnvelope};
use crate::normalize::normalize_reply;
use crate::prompt::{consultation_prompt, diagnosis_prompt};
use crate::server::errors::RelayError;
use crate::server::{liveness, ApiJson, ConsultRequest};

/// Application state shared across handlers.
pub struct AppState {
    pub backend: Arc<dyn CompletionBackend>,
    pub retry_count: u32,
}

/// Build the axum router with all relay routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/api/translation", post(translate))
        .route("/api", post(consult))
        .with_state(state)
}

async fn translate(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ConsultRequest>,
) -> Result<Json<Value>, RelayError> {
    let request_id = Uuid::new_v4().to_string();

    info!(
        request_id = request_id,
        chars = req.text.chars().count(),
        "Translation request"
    );

    let messages = diagnosis_prompt(&req.text);
    relay(&state, &request_id, &messages).await.map(Json)
}

async fn consult(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ConsultRequest>,
) -> Result<Json<Value>, RelayError> {
    let request_id = Uuid::new_v4().to_string();
    let (kind, messages) = consultation_prompt(&req.text);

    info!(
        request_id = request_id,
        chars = req.text.chars().count(),
        prompt = %kind,
        "Consultation request"
    );

    relay(&state, &request_id, &messages).await.map(Json)
}

/// Call the model and normalize its first reply.
async fn relay(
    state: &AppState,
    request_id: &str,
    messages: &[ChatMessage],
) -> Result<Value, RelayError> {
    let body = state
        .backend
        .complete(messages, state.retry_count)
        .await
        .map_err(|e| {
            error!(request_id, error = %e, "Model call failed");
            RelayError::from(e)
        })?;

    let content = first_content(body).map_err(|e| {
        error!(request_id, error = %e, "Unusable model response");
        e
    })?;

    debug!(request_id, content = %content, "Model reply");
    Ok(normalize_reply(&content))
}

/// Extract `choices[0].message.content` from a completion body.
pub fn first_content(body: Value) -> Result<String, RelayError> {
    let envelope: CompletionEnvelope = serde_json::from_value(body)
        .map_err(|e| RelayError::MalformedEnvelope(e.to_string()))?;
    envelope
        .into_first_content()
        .ok_or_else(|| RelayError::MalformedEnvelope("response has no choices".to_string()))
}

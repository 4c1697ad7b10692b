//! Fixed-latency fake of the consultation API.
//!
//! Accepts the same request shape as the relay, waits through two logged
//! stages (5 s + 10.5 s by default) and answers `true`. Waits are
//! cooperative, so concurrent requests overlap instead of queueing.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::info;

use crate::config::MockConfig;
use crate::server::{liveness, ApiJson, ConsultRequest};

/// Model name shown in the mock's stage logs.
const MOCK_MODEL_LABEL: &str = "deepseek-reasoner";

/// Mock service state.
pub struct MockState {
    pub config: MockConfig,
}

/// Build the axum router for the mock service.
pub fn build_mock_router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/api", post(fake_consult))
        .with_state(state)
}

async fn fake_consult(
    State(state): State<Arc<MockState>>,
    ApiJson(req): ApiJson<ConsultRequest>,
) -> Json<bool> {
    info!(text = %req.text, "Received request");

    info!(model = MOCK_MODEL_LABEL, "Sending request to model");
    tokio::time::sleep(state.config.send_stage()).await;

    info!("Resolving data");
    tokio::time::sleep(state.config.resolve_stage()).await;

    info!("Data resolved");
    Json(true)
}

//! HTTP surface of the relay and mock services.
//!
//! - [`relay_api`]: consultation routes backed by the model caller
//! - [`mock_api`]: fixed-latency fake of the consultation route
//! - [`errors`]: error-to-response translation

pub mod errors;
pub mod mock_api;
pub mod relay_api;

use axum::extract::FromRequest;
use axum::Json;
use axum::Router;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Liveness response of `GET /`.
#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub message: &'static str,
}

pub(crate) async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        message: "request received",
    })
}

/// JSON body extractor whose rejections render as `{"detail": ...}`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(errors::RelayError))]
pub struct ApiJson<T>(pub T);

/// Request body shared by every consultation route.
#[derive(Debug, serde::Deserialize)]
pub struct ConsultRequest {
    pub text: String,
}

/// Wrap a service router with CORS and request tracing.
///
/// CORS is fully open with credentials allowed. The request origin is
/// mirrored since a literal `*` cannot be combined with credentials.
pub fn with_common_layers(router: Router) -> Router {
    router
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
}

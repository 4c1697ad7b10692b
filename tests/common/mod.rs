//! Shared fixtures: a local OpenAI-style upstream and caller settings.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;

use consult_relay::model::caller::CallerSettings;

pub const COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// What the upstream saw on its last completion request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub authorization: Option<String>,
    pub body: serde_json::Value,
}

struct UpstreamState {
    status: StatusCode,
    body: String,
    delay: Duration,
    posts: AtomicUsize,
    probes: AtomicUsize,
    last: Mutex<Option<RecordedRequest>>,
}

/// A running fake completion endpoint.
#[derive(Clone)]
pub struct Upstream {
    pub addr: SocketAddr,
    state: Arc<UpstreamState>,
}

impl Upstream {
    pub fn url(&self) -> String {
        format!("http://{}{}", self.addr, COMPLETIONS_PATH)
    }

    pub fn posts(&self) -> usize {
        self.state.posts.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> usize {
        self.state.probes.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.state.last.lock().unwrap().clone()
    }
}

/// Spawn an upstream that answers every completion POST with `status`/`body`.
pub async fn spawn_upstream(status: StatusCode, body: impl Into<String>) -> Upstream {
    spawn_slow_upstream(status, body, Duration::ZERO).await
}

/// Like [`spawn_upstream`], but waits `delay` before answering.
pub async fn spawn_slow_upstream(
    status: StatusCode,
    body: impl Into<String>,
    delay: Duration,
) -> Upstream {
    let state = Arc::new(UpstreamState {
        status,
        body: body.into(),
        delay,
        posts: AtomicUsize::new(0),
        probes: AtomicUsize::new(0),
        last: Mutex::new(None),
    });

    let app = Router::new()
        .route("/", get(probe))
        .route(COMPLETIONS_PATH, post(completions))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Upstream { addr, state }
}

async fn probe(State(state): State<Arc<UpstreamState>>) -> &'static str {
    state.probes.fetch_add(1, Ordering::SeqCst);
    "ok"
}

async fn completions(
    State(state): State<Arc<UpstreamState>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    state.posts.fetch_add(1, Ordering::SeqCst);
    *state.last.lock().unwrap() = Some(RecordedRequest {
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_str(&body).unwrap_or(serde_json::Value::Null),
    });

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    (
        state.status,
        [(header::CONTENT_TYPE, "application/json")],
        state.body.clone(),
    )
}

/// OpenAI-style completion body whose first choice carries `content`.
pub fn completion_body(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }
        ]
    })
    .to_string()
}

/// URL on 127.0.0.1 where nothing is listening.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}{COMPLETIONS_PATH}")
}

/// Caller settings tuned for tests: no probe, 10 ms backoff unit.
pub fn test_settings(url: &str, api_key: Option<&str>) -> CallerSettings {
    CallerSettings {
        api_key: api_key.map(str::to_string),
        model: "test-model".to_string(),
        url: url.to_string(),
        temperature: 0.3,
        request_timeout: Duration::from_secs(5),
        probe: false,
        probe_timeout: Duration::from_secs(1),
        backoff_unit: Duration::from_millis(10),
    }
}

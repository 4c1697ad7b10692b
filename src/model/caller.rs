//! Retrying chat completion client.
//!
//! One [`ModelCaller`] is built at startup from immutable [`CallerSettings`]
//! and shared by every request. Each call:
//! 1. Fails fast when no API key is configured
//! 2. Optionally probes the endpoint host (diagnostic only)
//! 3. POSTs the completion request
//! 4. Retries with exponential backoff on connection failures only

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::ModelConfig;
use crate::model::errors::{error_chain, CallError};
use crate::model::types::{ChatMessage, CompletionRequest};

/// Something that can turn a prompt into a raw completion body.
///
/// The relay routes only see this trait, so they can be exercised without
/// a network.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Send `messages` and return the parsed JSON body of the reply,
    /// allowing up to `retry_count` additional attempts on connection failure.
    async fn complete(&self, messages: &[ChatMessage], retry_count: u32) -> Result<Value, CallError>;
}

/// Resolved settings for the model caller.
#[derive(Clone)]
pub struct CallerSettings {
    /// Bearer token; `None` or empty means unauthenticated.
    pub api_key: Option<String>,

    /// Model name sent in the request body.
    pub model: String,

    /// Completion endpoint URL.
    pub url: String,

    /// Sampling temperature.
    pub temperature: f64,

    /// Per-attempt POST timeout.
    pub request_timeout: Duration,

    /// Whether to probe the endpoint host before each attempt.
    pub probe: bool,

    /// Probe timeout.
    pub probe_timeout: Duration,

    /// Attempt `i` is followed by a wait of `backoff_unit * 2^i`.
    pub backoff_unit: Duration,
}

impl CallerSettings {
    pub fn from_config(model: &ModelConfig, api_key: Option<String>) -> Self {
        Self {
            api_key,
            model: model.name.clone(),
            url: model.url.trim().to_string(),
            temperature: model.temperature,
            request_timeout: Duration::from_secs(model.request_timeout_secs),
            probe: model.probe,
            probe_timeout: Duration::from_secs(model.probe_timeout_secs),
            backoff_unit: Duration::from_millis(model.backoff_unit_ms),
        }
    }
}

impl std::fmt::Debug for CallerSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallerSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("url", &self.url)
            .field("temperature", &self.temperature)
            .field("request_timeout", &self.request_timeout)
            .field("probe", &self.probe)
            .field("probe_timeout", &self.probe_timeout)
            .field("backoff_unit", &self.backoff_unit)
            .finish()
    }
}

/// Outcome of a single failed attempt.
enum AttemptFailure {
    /// Connection could not be established; eligible for retry.
    Connect(String),
    /// Anything else; surfaced immediately.
    Fatal(CallError),
}

impl From<reqwest::Error> for AttemptFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            AttemptFailure::Connect(error_chain(e))
        } else {
            let status = e.status().map(|s| s.as_u16());
            AttemptFailure::Fatal(CallError::Http {
                status,
                reason: error_chain(e),
            })
        }
    }
}

/// Chat completion client with bounded retry.
#[derive(Debug)]
pub struct ModelCaller {
    settings: CallerSettings,
}

impl ModelCaller {
    pub fn new(settings: CallerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CallerSettings {
        &self.settings
    }

    /// Call the model endpoint, making at most `retry_count + 1` attempts.
    ///
    /// The HTTP client lives for the duration of this call only.
    pub async fn call(&self, messages: &[ChatMessage], retry_count: u32) -> Result<Value, CallError> {
        let api_key = match self.settings.api_key.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => {
                error!("API key not configured, refusing to call model endpoint");
                return Err(CallError::MissingCredential);
            }
        };

        let url = self.settings.url.as_str();
        let body = CompletionRequest {
            model: &self.settings.model,
            messages,
            temperature: self.settings.temperature,
        };

        let http = HttpClient::builder()
            .timeout(self.settings.request_timeout)
            .build()
            .map_err(|e| CallError::Unexpected {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        let total = retry_count.saturating_add(1);
        let mut attempt: u32 = 0;

        loop {
            info!(
                attempt = attempt + 1,
                total,
                url,
                model = %self.settings.model,
                "Sending request to model API"
            );

            if self.settings.probe {
                self.probe_host(&http, url).await;
            }

            match self.post_once(&http, url, api_key, &body).await {
                Ok(value) => return Ok(value),
                Err(AttemptFailure::Connect(reason)) if attempt < retry_count => {
                    error!(attempt = attempt + 1, total, error = %reason, "Connection error");
                    let wait = backoff_delay(self.settings.backoff_unit, attempt);
                    info!(wait_ms = wait.as_millis() as u64, "Waiting before retry");
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(AttemptFailure::Connect(reason)) => {
                    error!(attempt = attempt + 1, total, error = %reason, "Connection error");
                    error!(url, attempts = total, "All retry attempts failed");
                    return Err(CallError::Unavailable {
                        endpoint: url.to_string(),
                        attempts: total,
                        reason,
                    });
                }
                Err(AttemptFailure::Fatal(e)) => {
                    error!(attempt = attempt + 1, url, error = %e, "Model API call failed");
                    return Err(e);
                }
            }
        }
    }

    async fn post_once(
        &self,
        http: &HttpClient,
        url: &str,
        api_key: &str,
        body: &CompletionRequest<'_>,
    ) -> Result<Value, AttemptFailure> {
        let response = http
            .post(url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await?
            .error_for_status()?;

        response.json::<Value>().await.map_err(|e| {
            if e.is_decode() {
                AttemptFailure::Fatal(CallError::Unexpected {
                    reason: format!("response body is not JSON: {}", error_chain(e)),
                })
            } else {
                AttemptFailure::from(e)
            }
        })
    }

    /// Best-effort GET against the endpoint's origin. Never fails the call.
    async fn probe_host(&self, http: &HttpClient, url: &str) {
        let Some(probe_target) = probe_url(url) else {
            warn!(url, "Cannot derive host from model URL, skipping connectivity probe");
            return;
        };

        if let Err(e) = http
            .get(&probe_target)
            .timeout(self.settings.probe_timeout)
            .send()
            .await
        {
            warn!(probe_target, error = %error_chain(e), "Model host connectivity probe failed");
        }
    }
}

#[async_trait]
impl CompletionBackend for ModelCaller {
    async fn complete(&self, messages: &[ChatMessage], retry_count: u32) -> Result<Value, CallError> {
        self.call(messages, retry_count).await
    }
}

/// Delay after failed attempt `attempt` (0-based): `unit * 2^attempt`.
pub fn backoff_delay(unit: Duration, attempt: u32) -> Duration {
    let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
    unit.saturating_mul(factor)
}

/// Bare origin (`scheme://host[:port]/`) of the configured endpoint.
pub fn probe_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    parsed.host_str()?;
    Some(format!("{}/", parsed.origin().ascii_serialization()))
}

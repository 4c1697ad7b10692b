//! Runtime configuration for consult-relay.
//!
//! Configuration is loaded once at startup from a TOML file and is immutable
//! afterwards. Every section has defaults, so a partial (or missing) file is
//! valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing_appender::rolling::Rotation;

/// Environment variable holding the upstream bearer token.
pub const API_KEY_ENV: &str = "API_KEY";

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "consult-relay", about = "TCM consultation relay for a remote LLM endpoint")]
pub struct Cli {
    /// Path to configuration file (TOML).
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// HTTP listen address; overrides `[server]` host/port.
    #[arg(long)]
    pub listen: Option<String>,

    /// Which service to run.
    #[arg(long, value_enum, default_value_t = Mode::Relay)]
    pub mode: Mode,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Service selected at startup.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Forward requests to the configured model endpoint.
    Relay,
    /// Fixed-latency fake for client integration testing.
    Mock,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,

    /// Logging configuration.
    pub log: LogConfig,

    /// Upstream model configuration.
    pub model: ModelConfig,

    /// Mock service timings.
    pub mock: MockConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,

    /// Write log lines to this file (rolled per `rotation`) instead of stdout.
    pub file: Option<PathBuf>,

    /// How often the log file is rolled over.
    pub rotation: LogRotation,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            rotation: LogRotation::Daily,
        }
    }
}

/// Log file rollover period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Minutely => Rotation::MINUTELY,
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Never => Rotation::NEVER,
        }
    }
}

/// Where a rolling log file goes: directory, file name prefix and suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileParts {
    pub directory: PathBuf,
    pub prefix: String,
    pub suffix: Option<String>,
}

impl LogConfig {
    /// Split `file` into the pieces the rolling appender needs.
    ///
    /// `logs/app.log` becomes directory `logs`, prefix `app`, suffix `log`;
    /// rolled files are named `app.<date>.log`.
    pub fn file_parts(&self) -> Option<LogFileParts> {
        let path = self.file.as_ref()?;
        let prefix = path.file_stem()?.to_string_lossy().into_owned();
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let suffix = path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned());

        Some(LogFileParts {
            directory,
            prefix,
            suffix,
        })
    }
}

/// Upstream model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model name sent in every completion request.
    pub name: String,

    /// Full chat completion URL.
    pub url: String,

    /// Sampling temperature.
    pub temperature: f64,

    /// Additional attempts after the first on connection failure.
    pub retry_count: u32,

    /// Per-attempt POST timeout in seconds.
    pub request_timeout_secs: u64,

    /// Issue a best-effort GET to the endpoint host before each attempt.
    pub probe: bool,

    /// Timeout of the connectivity probe in seconds.
    pub probe_timeout_secs: u64,

    /// Backoff unit in milliseconds; attempt `i` waits `unit * 2^i`.
    pub backoff_unit_ms: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "deepseek-chat".to_string(),
            url: "https://api.deepseek.com/v1/chat/completions".to_string(),
            temperature: 0.7,
            retry_count: 2,
            request_timeout_secs: 60,
            probe: true,
            probe_timeout_secs: 5,
            backoff_unit_ms: 1000,
        }
    }
}

/// Mock service stage durations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MockConfig {
    pub send_stage_ms: u64,
    pub resolve_stage_ms: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            send_stage_ms: 5_000,
            resolve_stage_ms: 10_500,
        }
    }
}

impl MockConfig {
    pub fn send_stage(&self) -> Duration {
        Duration::from_millis(self.send_stage_ms)
    }

    pub fn resolve_stage(&self) -> Duration {
        Duration::from_millis(self.resolve_stage_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults if the file is absent.
    ///
    /// Runs before logging is set up, so the caller reports the fallback.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            Self::from_toml(&data)
        } else {
            Ok(Config::default())
        }
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(data: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(data)?;
        Ok(config)
    }

    /// Listen address derived from `[server]`.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Load variables from a `.env` file in the working directory or its parents.
///
/// Variables already set in the process environment win. Returns the file
/// that was loaded, if any.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Read the API key from the environment; an empty value counts as unset.
pub fn api_key_from_env() -> Option<String> {
    std::env::var(API_KEY_ENV).ok().filter(|key| !key.is_empty())
}

//! consult-relay: TCM consultation relay for a remote LLM endpoint.
//!
//! Runs either the relay service (prompt templating, retrying upstream
//! calls, JSON recovery) or the fixed-latency mock service.

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;

use consult_relay::config::{
    api_key_from_env, load_dotenv, Cli, Config, LogConfig, Mode, API_KEY_ENV,
};
use consult_relay::model::caller::{CallerSettings, ModelCaller};
use consult_relay::server::mock_api::{build_mock_router, MockState};
use consult_relay::server::relay_api::{build_router, AppState};
use consult_relay::server::with_common_layers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up `.env` before anything reads the environment.
    let dotenv_path = load_dotenv();

    // Parse CLI arguments.
    let cli = Cli::parse();

    // Load configuration before logging so `[log]` can shape the subscriber.
    let config = Config::load(&cli.config)?;
    // Flushes buffered log lines on drop; must outlive the server.
    let _log_guard = init_tracing(&cli, &config.log)?;

    info!("consult-relay v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = dotenv_path {
        info!("Loaded environment from {:?}", path);
    }
    if !cli.config.exists() {
        warn!("Config file not found at {:?}, using defaults", cli.config);
    }

    let app = match cli.mode {
        Mode::Relay => {
            let api_key = api_key_from_env();
            if api_key.is_none() {
                warn!("{API_KEY_ENV} is not set; model calls will be rejected");
            }

            let settings = CallerSettings::from_config(&config.model, api_key);
            info!(
                model = %settings.model,
                url = %settings.url,
                temperature = settings.temperature,
                retry_count = config.model.retry_count,
                probe = settings.probe,
                "Model configuration loaded"
            );

            let state = Arc::new(AppState {
                backend: Arc::new(ModelCaller::new(settings)),
                retry_count: config.model.retry_count,
            });
            build_router(state)
        }
        Mode::Mock => {
            info!(
                send_stage_ms = config.mock.send_stage_ms,
                resolve_stage_ms = config.mock.resolve_stage_ms,
                "Running mock service"
            );
            build_mock_router(Arc::new(MockState {
                config: config.mock.clone(),
            }))
        }
    };
    let app = with_common_layers(app);

    // Start the server.
    let listen_addr = cli.listen.clone().unwrap_or_else(|| config.listen_addr());
    let listener = TcpListener::bind(&listen_addr).await?;
    info!("Listening on {listen_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize tracing/logging. `RUST_LOG` wins over `[log] level`.
///
/// With `[log] file` set, lines go through a non-blocking rolling appender;
/// the returned guard flushes it on shutdown.
fn init_tracing(cli: &Cli, log: &LogConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let level = if cli.verbose { "debug" } else { log.level.as_str() };
    let filter = format!("consult_relay={level},tower_http={level}");

    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true);

    let Some(parts) = log.file_parts() else {
        builder.init();
        return Ok(None);
    };

    let mut appender = rolling::Builder::new()
        .rotation(log.rotation.into())
        .filename_prefix(parts.prefix);
    if let Some(suffix) = parts.suffix {
        appender = appender.filename_suffix(suffix);
    }
    let appender = appender.build(&parts.directory)?;

    let (writer, guard) = tracing_appender::non_blocking(appender);
    builder.with_ansi(false).with_writer(writer).init();

    Ok(Some(guard))
}

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use scc_provisioner::gcp::auth::GcpCredentials;
use scc_provisioner::gcp::client::GcpClient;
use scc_provisioner::{server, Config, TriggerHandler};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Provision SCC notification resources for newly created projects
#[derive(Parser, Debug)]
#[command(name = "scc-provisioner", version, about, long_about = None)]
struct Args {
    /// Port for the Pub/Sub push endpoint
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Config file (JSON, or YAML with a .yaml/.yml extension)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Log output format
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    /// One JSON object per line, for Cloud Logging
    Json,
}

fn setup_logging(level: LogLevel, format: LogFormat) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    // RUST_LOG refines the level given on the command line
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(tracing_level).into())
        .from_env_lossy();

    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    match format {
        LogFormat::Text => builder.with_ansi(false).init(),
        LogFormat::Json => builder.json().with_current_span(true).init(),
    }

    tracing::info!("scc-provisioner {} started with log level: {:?}", env!("CARGO_PKG_VERSION"), level);

    Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level, args.log_format);

    let config = Config::load(args.config.as_deref())?;
    tracing::info!(
        "Host project: {}, organization override: {}, on_existing: {:?}",
        config.host_project(),
        config.org_id.as_deref().unwrap_or("none"),
        config.on_existing
    );

    let credentials = match config.access_token.as_deref() {
        Some(token) => {
            tracing::warn!("Using static access token from configuration");
            GcpCredentials::from_static_token(token)
        }
        None => GcpCredentials::from_adc().await?,
    };
    let client = GcpClient::new(credentials, config.endpoints.clone())?;
    let handler = TriggerHandler::new(client, &config);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port))
        .await
        .with_context(|| format!("Failed to bind port {}", args.port))?;
    tracing::info!("Listening for Pub/Sub push deliveries on {}", listener.local_addr()?);

    server::serve(listener, handler).await
}

mod api;
mod config_cmd;
mod status_cmd;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use kunstbot_channels::{ChannelAdapter, MessengerAdapter, MessengerConfig};
use kunstbot_config::{config_file_path, load_and_prepare, redact, Settings};
use kunstbot_search::HttpSearchBackend;

#[derive(Parser)]
#[command(name = "kunstbot")]
#[command(about = "kunstbot — Messenger relay for art search")]
#[command(version)]
struct Cli {
    /// Path to the YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,

        /// Log outbound messages instead of calling the send API
        #[arg(long)]
        mock: bool,
    },
    /// Show the status of a running server
    Status,
    /// Validate the configuration and print it with secrets masked
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let path = config_file_path(cli.config.as_deref());

    match cli.command {
        Commands::Serve { port, mock } => {
            let mut settings = load_and_prepare(&path).await?;
            if let Some(port) = port {
                settings.port = port;
            }
            settings.mock_mode |= mock;
            run_server(settings, &path).await?;
        }
        Commands::Status => {
            let settings = load_and_prepare(&path).await?;
            status_cmd::run(&settings).await?;
        }
        Commands::CheckConfig => {
            let settings = load_and_prepare(&path).await?;
            config_cmd::run(&settings)?;
        }
    }

    Ok(())
}

async fn run_server(settings: Settings, config_path: &Path) -> Result<()> {
    logging::init_logger(&settings.log_level, settings.log_dir.as_deref().map(Path::new));

    info!(
        config = %config_path.display(),
        settings = %redact(&serde_json::to_value(&settings)?),
        "Starting kunstbot"
    );
    if settings.mock_mode {
        warn!("Mock mode is on: outbound messages are logged, not sent");
    }

    let search = Arc::new(HttpSearchBackend::new(&settings.search_url));
    let messenger = MessengerAdapter::new(MessengerConfig::from(&settings), search);
    messenger.start().await?;
    info!(
        channel = messenger.name(),
        path = messenger.webhook_path(),
        "Registered channel adapter"
    );

    let app = api::build_router(vec![messenger.build_router()]).layer(TraceLayer::new_for_http());
    let addr = settings.listen_addr();

    info!(addr = %addr, "HTTP server listening");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("kunstbot stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

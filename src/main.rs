use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use surveyvoice::{AppState, ServerConfig, routes};

/// SurveyVoice - speech synthesis service for spoken questionnaire delivery
#[derive(Parser, Debug)]
#[command(name = "surveyvoice")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Bind host (overrides SURVEYVOICE_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides SURVEYVOICE_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to a Google service account key file (overrides environment
    /// resolution; primary synthesis is disabled when nothing resolves)
    #[arg(long = "credentials", value_name = "FILE")]
    credentials: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let mut config = ServerConfig::from_env();
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(credentials) = cli.credentials {
        config.google_credentials = Some(credentials.display().to_string());
    }

    let state = AppState::from_config(&config)
        .map_err(|err| anyhow::anyhow!(err.to_string()))
        .context("failed to build synthesis pipeline")?;

    if state.credentials.is_available() {
        info!(
            project_id = state.credentials.project_id(),
            "primary synthesis enabled"
        );
    } else {
        info!("primary synthesis disabled, running fallback-only");
    }

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let address = config.address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!(%address, "SurveyVoice listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install shutdown signal handler");
    }
    info!("shutdown signal received");
}

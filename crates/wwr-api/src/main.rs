//! wwr-api: HTTP server for the wwr issue tracker
//!
//! Serves the legacy `/issueServer` endpoint used by the terminal client and a
//! JSON API over the same tracker.

mod app;
mod legacy;
mod routes;

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use wwr_core::{Config, Tracker};

#[derive(Parser)]
#[command(name = "wwr-api")]
#[command(about = "HTTP server for the wwr issue tracker", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the config file
    #[arg(long, env = "WWR_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the tracker files
    #[arg(long, env = "WWR_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "WWR_API_PORT")]
    port: Option<u16>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<Config> {
        let mut config = Config::discover(self.config.as_deref()).context("Failed to load config")?;
        if let Some(data_dir) = self.data_dir {
            config.data_dir = data_dir;
        }
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        Ok(config)
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Args::parse().into_config()?;
    let tracker = Tracker::open(&config).with_context(|| {
        format!("Failed to open tracker in {}", config.data_dir.display())
    })?;

    let app = app::router(app::AppState::new(tracker));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Starting wwr-api on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

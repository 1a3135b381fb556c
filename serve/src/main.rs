//! serve - serve a directory over HTTP
//!
//! This is the main entry point for the serve CLI.

mod cli;

use anyhow::Context;
use serve_core::{Server, ShutdownSignal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;

#[cfg(target_os = "linux")]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse_normalized();

    let config = cli.into_config().map_err(|e| {
        tracing::error!("{}", e);
        e
    })?;

    if !config.root.is_dir() {
        tracing::warn!("Serving {} which is not a directory", config.root.display());
    }
    tracing::info!("Serving files from: {}", config.root.display());

    // Listen before binding so a signal during startup is not missed
    let shutdown = ShutdownSignal::install()?;

    if config.compression {
        tracing::info!("HTTP server will return gzip values if permitted by browser.");
    }
    let handler = serve_static::handler_chain(&config);

    let server = match Server::bind(&config, handler).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("{}", e);
            return Err(e).context("server failed to start");
        }
    };

    let signal = server.serve_until(shutdown.recv()).await;

    // In-flight responses are cut off: no draining
    tracing::info!("Captured {}. Shutting down...", signal);
    std::process::exit(0);
}

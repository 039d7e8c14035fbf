//! reqalert - HTTP request alerting
//!
//! Runs a small HTTP server whose requests of interest (watched paths, server
//! errors) are described, geolocated and reported to a Telegram chat.

use anyhow::Result;
use clap::Parser;
use reqalert::{cli::Cli, config::Config, internal_metrics, server};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(err) => {
            // Logging is not configured yet, fall back to the default filter.
            tracing_subscriber::fmt().init();
            error!("Failed to load configuration: {}", err);
            std::process::exit(1);
        }
    };

    // RUST_LOG takes precedence over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("reqalert starting up...");

    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Listen Address: {}", config.server.listen_address);
    info!("Watched Paths: {:?}", config.server.watched_paths);
    info!("Alert On Server Error: {}", config.server.alert_on_server_error);
    if config.geo.enabled {
        info!("Geolocation: {}", config.geo.base_url);
    } else {
        info!("Geolocation: Disabled");
    }
    let telegram_ready = config.telegram.bot_token.as_deref().is_some_and(|t| !t.is_empty())
        && config.telegram.chat_id.as_deref().is_some_and(|c| !c.is_empty());
    if telegram_ready {
        info!("Telegram: Enabled");
    } else {
        warn!("Telegram: bot token or chat id missing, alerts will only be logged.");
    }
    info!("Metrics: {}", if config.metrics.enabled { "Enabled" } else { "Disabled" });
    info!("-------------------------------------------------------");

    let prometheus = if config.metrics.enabled {
        Some(internal_metrics::install_prometheus()?)
    } else {
        None
    };

    let hook = server::build_hook(&config);
    let router = server::router(hook, prometheus);
    let listener = TcpListener::bind(&config.server.listen_address).await?;

    server::serve(listener, router, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Shutdown signal received. Shutting down gracefully...");
    })
    .await
}

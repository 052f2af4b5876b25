mod api;
mod app;
mod bootstrap;
mod contact;
mod health;
mod integrations;
mod lookups;
mod pages;
mod sessions;
mod wizard;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use bulkrooms_core::config::{AppConfig, LoadOptions};
use tokio::net::TcpListener;
use tokio::sync::Notify;

fn init_logging(config: &AppConfig) {
    use bulkrooms_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Logging needs the loaded config, so load it before bootstrapping.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = TcpListener::bind(&address).await?;
    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    let counters = app.state.counters.clone();

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        address = %address,
        "bulkrooms-server listening"
    );

    let shutdown = Arc::new(Notify::new());
    let signal = shutdown.clone();
    let server = axum::serve(listener, app::router(app.state))
        .with_graceful_shutdown(async move { signal.notified().await });
    let mut server = tokio::spawn(async move { server.await });

    tokio::select! {
        result = &mut server => result??,
        signal = wait_for_shutdown() => {
            signal?;
            tracing::info!(
                event_name = "system.server.stopping",
                correlation_id = "shutdown",
                grace_secs = grace.as_secs(),
                "draining in-flight requests"
            );
            shutdown.notify_one();
            match tokio::time::timeout(grace, &mut server).await {
                Ok(result) => result??,
                Err(_) => {
                    server.abort();
                    tracing::warn!(
                        event_name = "system.server.drain_timeout",
                        correlation_id = "shutdown",
                        "in-flight requests did not finish before the grace period"
                    );
                }
            }
        }
    }

    if let Err(error) = counters.flush() {
        tracing::error!(
            event_name = "system.counters.flush_failed",
            correlation_id = "shutdown",
            error = %error,
            "could not persist counters at shutdown"
        );
    }
    tracing::info!(
        event_name = "system.server.stopped",
        correlation_id = "shutdown",
        "bulkrooms-server stopped"
    );

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}

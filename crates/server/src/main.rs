mod bootstrap;
mod health;

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use pelada_core::config::{AppConfig, LoadOptions};
use tracing_subscriber::EnvFilter;

fn init_logging(config: &AppConfig) {
    use pelada_core::config::LogFormat::*;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Logging depends on config, so it has to come first.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config)?;

    health::spawn(
        &app.config.server.bind_address,
        app.config.server.health_check_port,
        Arc::clone(&app.sequencer),
    )
    .await?;

    tracing::info!(
        event_name = "system.server.slack_transport_mode",
        transport_mode = app.transport_mode,
        correlation_id = "bootstrap",
        "slack runner transport mode initialized"
    );

    app.slack_runner.start().await?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        roster_size = app.sequencer.roster().len(),
        exhaustive_limit = app.desk.balancer().settings().exhaustive_limit,
        "pelada-server started"
    );
    wait_for_shutdown().await?;

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    let open_sessions = app.sequencer.active_sessions();
    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        open_sessions,
        grace_secs = grace.as_secs(),
        "pelada-server stopping"
    );
    if open_sessions > 0 {
        // In-flight polls are in memory only and are dropped on exit.
        tokio::time::sleep(grace.min(Duration::from_secs(1))).await;
    }

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}

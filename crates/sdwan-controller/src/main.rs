//! SD-WAN Controller - Main Entry Point

use sdwan_common::SystemClock;
use sdwan_controller::{api, Controller, ControllerConfig};
use sdwan_path::SampleQueue;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("SD-WAN Controller v{}", env!("CARGO_PKG_VERSION"));

    // Load config
    let config_path = std::env::var("CONFIG_PATH")
        .unwrap_or_else(|_| "/etc/sdwan/controller.json".into());

    let config = ControllerConfig::load(&config_path).unwrap_or_else(|e| {
        tracing::warn!("Config not loaded ({}), using defaults", e);
        ControllerConfig::default()
    });

    let controller = Arc::new(Controller::new(config, Arc::new(SystemClock)));

    // Probing agent feeds this queue; until one is attached, paths keep
    // their last reported metrics
    let source = Arc::new(SampleQueue::new());
    let scheduler = Arc::new(controller.scheduler(source));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (refresh, optimize) = scheduler.spawn(shutdown_rx.clone());

    let listen = controller.config().api_listen.clone();
    let server = tokio::spawn(api::start_server(listen, controller.clone(), shutdown_rx));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    shutdown_tx.send(true)?;

    refresh.await?;
    optimize.await?;
    server.await??;

    Ok(())
}

use std::io;
use std::sync::Arc;

use log::{error, info};

use account_risk::app::build_state;
use account_risk::core::clock::SystemClock;
use account_risk::core::config::AppConfig;
use account_risk::web::start_web_server;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Initialize logging
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    info!("Starting Account Risk Assessment service...");

    let config = AppConfig::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    // Build components and start the orchestrator
    let state = build_state(&config, Arc::new(SystemClock)).await.map_err(|e| {
        error!("Failed to start components: {}", e);
        io::Error::new(io::ErrorKind::Other, e)
    })?;

    // Runs until Ctrl+C
    info!("Service is now running. Press Ctrl+C to stop.");
    let result = start_web_server(&config.server, state.clone()).await;

    info!("Shutting down components...");
    if let Err(e) = state.orchestrator.write().await.stop_all().await {
        error!("Error during component shutdown: {}", e);
    }

    info!("Account Risk Assessment shutdown complete");
    result
}

//! PeiPlay API server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p peiplay-api
//! ```
//!
//! Configuration is read from environment variables; a `.env` file is loaded
//! first when present.

use peiplay_common::{try_init_tracing, AppConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    if let Err(e) = try_init_tracing() {
        eprintln!("Warning: Failed to initialize tracing: {}", e);
    }

    if let Err(e) = run().await {
        error!(error = %e, "Server failed to start");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting PeiPlay API server...");

    let config = AppConfig::from_env().map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;

    info!(
        env = ?config.app.env,
        address = %config.api.address(),
        scheduler = config.cron.scheduler_enabled,
        "Configuration loaded"
    );

    peiplay_api::run(config).await?;

    Ok(())
}

/// Main entry point for the Kite bridge service
use tracing::{info, warn};

use kitebridge::api::ApiServer;
use kitebridge::config::load_config;
use kitebridge::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::var("CONFIG_PATH")
        .unwrap_or_else(|_| "config.toml".to_string());

    let mut config = load_config(&config_path)?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(config.log_level.clone())
        .init();

    info!("Configuration loaded from {}", config_path);

    // PORT wins over the configured port when set
    if let Ok(port) = std::env::var("PORT") {
        match port.parse::<u16>() {
            Ok(port) => config.port = port,
            Err(_) => warn!("Ignoring unparseable PORT value: {}", port),
        }
    }

    let server = ApiServer::new(config);
    server.run().await
}

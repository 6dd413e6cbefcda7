#![cfg(not(tarpaulin_include))]

use review_dashboard::{DashboardConfig, app};
use std::env;

/// Main entry point for the dashboard web server
///
/// # Arguments
/// * `--config <path>` - optional JSON configuration file
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = DashboardConfig::from_args(&args)?;

    // Start the web application
    app::run(config).await
}

//! UPRL Core binary entry point
//!
//! Responsibilities:
//! - Load the .env configuration file
//! - Set up the working directory
//! - Initialize the logging system
//! - Start the server

use std::path::PathBuf;
use uprl_server::{
    cleanup_old_logs, init_logger_with_file, print_banner, Config, Server, ServerState,
};

/// Set up the runtime environment (bin only)
///
/// - Loads the .env file
/// - Creates the required directory structure
/// - Initializes logging
fn setup_environment() -> Result<PathBuf, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let work_dir = std::env::var("WORK_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."));

    if !work_dir.exists() {
        std::fs::create_dir_all(&work_dir)?;
        println!("Created work directory: {}", work_dir.display());
    }

    let log_dir = work_dir.join("logs");
    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)?;
    }

    let json_format = std::env::var("LOG_JSON")
        .unwrap_or_else(|_| "false".to_string())
        .parse()
        .unwrap_or(false);

    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    init_logger_with_file(
        Some(&log_level),
        Some(json_format),
        Some(log_dir.to_str().unwrap_or("logs")),
    );

    // Retention: drop rolling log files older than a week
    match cleanup_old_logs(log_dir.to_str().unwrap_or("logs"), 7) {
        Ok(removed) if removed > 0 => tracing::info!(removed, "Cleaned up old log files"),
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "Log cleanup failed"),
    }

    tracing::info!(
        "Environment initialized. WorkDir: {}, LogLevel: {}",
        work_dir.display(),
        log_level
    );

    Ok(work_dir)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Environment (dotenv, working directory, logging)
    let work_dir = setup_environment()?;

    print_banner();

    tracing::info!("UPRL Core starting...");
    tracing::debug!("Work directory: {}", work_dir.display());

    // 2. Configuration (from environment variables)
    let mut config = Config::from_env();
    config.work_dir = work_dir.display().to_string();

    // 3. Server state (opens the fact store, reports recovery stats)
    let state = ServerState::initialize(&config)?;

    // 4. HTTP server
    let server = Server::with_state(config, state);
    let token = server.shutdown_token();

    // ctrl_c and server.run() race; either ending exits
    let result = tokio::select! {
        r = server.run() => r.map_err(|e| e.into()),
        _ = tokio::signal::ctrl_c() => {
            token.cancel();
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!("Server error: {}", e);
    }

    result
}

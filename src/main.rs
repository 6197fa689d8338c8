//! MEMEFOLIO server
//!
//! Entry point. Loads configuration, initialises structured logging,
//! opens the stores and serves the HTTP API until Ctrl+C.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use memefolio::config::AppConfig;
use memefolio::server::{self, ServerState};

const BANNER: &str = r#"
 __  __ _____ __  __ _____ _____ ___  _     ___ ___
|  \/  | ____|  \/  | ____|  ___/ _ \| |   |_ _/ _ \
| |\/| |  _| | |\/| |  _| | |_ | | | | |    | | | | |
| |  | | |___| |  | | |___|  _|| |_| | |___ | | |_| |
|_|  |_|_____|_|  |_|_____|_|   \___/|_____|___\___/

  Your portfolio, roasted. v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let config_path = AppConfig::path_from_env();
    let cfg = AppConfig::load_or_default(&config_path)?;

    println!("{BANNER}");
    info!(
        config = %config_path,
        host = %cfg.server.host,
        port = cfg.server.port,
        portfolios = %cfg.storage.portfolios_path,
        leaderboard = %cfg.storage.leaderboard_path,
        "MEMEFOLIO starting up"
    );

    let state = Arc::new(ServerState::from_config(&cfg)?);
    {
        let board = state.leaderboard.read().await;
        let saved = state.portfolios.read().await;
        info!(
            leaderboard_entries = board.entries().len(),
            saved_portfolios = saved.list().len(),
            "Stores loaded"
        );
    }

    server::serve(state, &cfg.server.host, cfg.server.port, shutdown_signal()).await?;

    info!("MEMEFOLIO shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown..."),
        Err(e) => warn!(error = %e, "Failed to listen for Ctrl+C"),
    }
}

/// Set up the tracing subscriber with env-filter support.
///
/// Defaults to `memefolio=info`; override with `RUST_LOG`.
/// Set `MEMEFOLIO_LOG_JSON` for JSON-formatted output.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("memefolio=info"));

    let json_logging = std::env::var("MEMEFOLIO_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}

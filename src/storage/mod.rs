//! Persistence layer.
//!
//! Saved portfolios and the leaderboard each live in a pretty-printed JSON
//! file holding a single array. The stores keep the list in memory and
//! rewrite the whole file after every mutation; callers serialise access
//! (the server holds each store behind a `RwLock`).

pub mod leaderboard;
pub mod portfolios;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

pub use leaderboard::{rank_badge, LeaderboardStore, LeaderboardSubmission};
pub use portfolios::PortfolioStore;

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Load a JSON array from `path`. A missing file is an empty list.
pub fn load_list<T: DeserializeOwned>(path: &str) -> Result<Vec<T>> {
    if !Path::new(path).exists() {
        info!(path, "No saved data found, starting empty");
        return Ok(Vec::new());
    }

    let json = std::fs::read_to_string(path).context(format!("Failed to read {path}"))?;
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }

    let items: Vec<T> =
        serde_json::from_str(&json).context(format!("Failed to parse {path}"))?;

    debug!(path, count = items.len(), "Loaded from disk");
    Ok(items)
}

/// Write `items` to `path` as a pretty-printed JSON array.
pub fn save_list<T: Serialize>(items: &[T], path: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(items).context("Failed to serialise list")?;

    std::fs::write(path, &json).context(format!("Failed to write {path}"))?;

    debug!(path, count = items.len(), "Saved to disk");
    Ok(())
}

/// Delete a store file (for testing or reset).
pub fn delete_file(path: &str) -> Result<()> {
    if Path::new(path).exists() {
        std::fs::remove_file(path).context(format!("Failed to delete {path}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) fn temp_path(prefix: &str) -> String {
    let mut p = std::env::temp_dir();
    p.push(format!("memefolio_test_{prefix}_{}.json", uuid::Uuid::new_v4()));
    p.to_string_lossy().to_string()
}

//! Configuration loading from TOML.
//!
//! Reads `config.toml` (or the path in `MEMEFOLIO_CONFIG`) and deserializes
//! into strongly-typed structs. Every field has a default, so a missing or
//! partial file still yields a usable configuration.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Default config file name, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Env var overriding the config file path.
pub const CONFIG_PATH_ENV: &str = "MEMEFOLIO_CONFIG";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub prices: PricesConfig,
    pub memes: MemesConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PricesConfig {
    /// Yahoo Finance base, without the `/v8/finance/chart` path.
    pub yahoo_base_url: String,
    /// CoinGecko API base, without `/simple/price`.
    pub coingecko_base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for PricesConfig {
    fn default() -> Self {
        Self {
            yahoo_base_url: "https://query1.finance.yahoo.com".to_string(),
            coingecko_base_url: "https://api.coingecko.com/api/v3".to_string(),
            timeout_secs: 15,
            user_agent: "Mozilla/5.0".to_string(),
        }
    }
}

impl PricesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MemesConfig {
    /// Only URLs starting with this prefix are proxied.
    pub image_host_prefix: String,
    pub cache_max_age_secs: u64,
    pub timeout_secs: u64,
}

impl Default for MemesConfig {
    fn default() -> Self {
        Self {
            image_host_prefix: crate::classify::meme::IMAGE_HOST_PREFIX.to_string(),
            cache_max_age_secs: 86_400,
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub portfolios_path: String,
    pub leaderboard_path: String,
    pub max_saved_portfolios: usize,
    pub leaderboard_capacity: usize,
    /// Returns strictly below this (in percent) may enter the leaderboard.
    pub leaderboard_threshold: f64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            portfolios_path: "memefolio_portfolios.json".to_string(),
            leaderboard_path: "memefolio_leaderboard.json".to_string(),
            max_saved_portfolios: 10,
            leaderboard_capacity: 50,
            leaderboard_threshold: -10.0,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            info!(path, "No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Config path from `MEMEFOLIO_CONFIG`, falling back to `config.toml`.
    pub fn path_from_env() -> String {
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let cfg = AppConfig::from_toml("").unwrap();
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.storage.max_saved_portfolios, 10);
        assert_eq!(cfg.storage.leaderboard_capacity, 50);
        assert_eq!(cfg.storage.leaderboard_threshold, -10.0);
        assert_eq!(cfg.memes.image_host_prefix, "https://i.imgflip.com/");
        assert_eq!(cfg.prices.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_partial_override() {
        let cfg = AppConfig::from_toml(
            r#"
            [server]
            port = 8080

            [storage]
            leaderboard_capacity = 5
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.storage.leaderboard_capacity, 5);
        assert_eq!(cfg.storage.max_saved_portfolios, 10);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(AppConfig::from_toml("[server]\nport = \"high\"").is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let cfg = AppConfig::load_or_default("/tmp/memefolio_no_such_config.toml").unwrap();
        assert_eq!(cfg.server.port, 3000);
    }

    #[test]
    fn test_load_repo_config() {
        // Only meaningful when run from the repository root
        if let Ok(cfg) = AppConfig::load(DEFAULT_CONFIG_FILE) {
            assert!(cfg.server.port > 0);
            assert!(cfg.storage.leaderboard_threshold < 0.0);
        }
    }
}

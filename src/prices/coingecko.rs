//! CoinGecko simple-price API.
//!
//! Endpoint: `GET {base}/simple/price?ids={id}&vs_currencies=usd&include_24hr_change=true`
//! Auth: none on the public tier. Tickers are mapped to coin ids via `CRYPTO_IDS`.

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{crypto_id, table_keys, PriceSource, CRYPTO_IDS};
use crate::config::PricesConfig;
use crate::error::PriceError;
use crate::types::{AssetClass, PriceQuote};

#[derive(Debug, Deserialize)]
struct CoinPrice {
    #[serde(default)]
    usd: Option<f64>,
    #[serde(default)]
    usd_24h_change: Option<f64>,
}

/// Keyed by coin id; unknown ids are simply absent.
type SimplePriceResponse = HashMap<String, CoinPrice>;

fn quote_from_response(
    symbol: &str,
    coin_id: &str,
    mut body: SimplePriceResponse,
) -> Result<PriceQuote, PriceError> {
    let coin = body
        .remove(coin_id)
        .ok_or_else(|| PriceError::NotFound(symbol.to_string()))?;
    let price = coin
        .usd
        .filter(|p| p.is_finite())
        .ok_or_else(|| PriceError::NotFound(symbol.to_string()))?;

    Ok(PriceQuote {
        symbol: symbol.to_string(),
        price,
        reference_price: None,
        change: None,
        change_percent: Some(coin.usd_24h_change.unwrap_or(0.0)),
        currency: Some("USD".to_string()),
        asset_class: AssetClass::Crypto,
    })
}

pub struct CoinGeckoSource {
    http: Client,
    base_url: String,
}

impl CoinGeckoSource {
    pub fn new(cfg: &PricesConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(cfg.timeout())
            .user_agent(cfg.user_agent.as_str())
            .build()
            .context("Failed to build HTTP client for CoinGecko")?;

        Ok(Self {
            http,
            base_url: cfg.coingecko_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PriceSource for CoinGeckoSource {
    fn asset_class(&self) -> AssetClass {
        AssetClass::Crypto
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<PriceQuote, PriceError> {
        let coin_id = crypto_id(symbol).ok_or_else(|| PriceError::UnsupportedSymbol {
            symbol: symbol.to_string(),
            supported: table_keys(CRYPTO_IDS),
        })?;

        let url = format!(
            "{}/simple/price?ids={}&vs_currencies=usd&include_24hr_change=true",
            self.base_url, coin_id,
        );

        debug!(url = %url, "Fetching CoinGecko price");

        let resp = self.http.get(&url).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(PriceError::Upstream(format!("CoinGecko API error {status}: {body}")));
        }

        let body: SimplePriceResponse = resp.json().await?;
        quote_from_response(symbol, coin_id, body)
    }

    fn name(&self) -> &'static str {
        "coingecko"
    }
}

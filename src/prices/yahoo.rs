//! Yahoo Finance chart API.
//!
//! Endpoint: `GET {base}/v8/finance/chart/{symbol}?interval=1d&range=1d`
//! Auth: none, but requests without a browser-like User-Agent are refused.
//! Serves stocks directly and commodities through their futures symbols.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::{commodity_symbol, table_keys, PriceSource, COMMODITY_SYMBOLS};
use crate::config::PricesConfig;
use crate::error::PriceError;
use crate::types::{AssetClass, PriceQuote};

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    regular_market_price: Option<f64>,
    #[serde(default)]
    previous_close: Option<f64>,
    #[serde(default)]
    chart_previous_close: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Turn a chart payload into a quote reported under `symbol`.
fn quote_from_chart(
    symbol: &str,
    body: ChartResponse,
    asset_class: AssetClass,
) -> Result<PriceQuote, PriceError> {
    if let Some(err) = body.chart.error {
        debug!(
            symbol,
            code = err.code.as_deref().unwrap_or(""),
            description = err.description.as_deref().unwrap_or(""),
            "Yahoo chart error"
        );
        return Err(PriceError::NotFound(symbol.to_string()));
    }

    let meta = body
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .map(|r| r.meta)
        .ok_or_else(|| PriceError::NotFound(symbol.to_string()))?;

    let price = meta
        .regular_market_price
        .filter(|p| p.is_finite())
        .ok_or_else(|| PriceError::NotFound(symbol.to_string()))?;
    let reference = meta.previous_close.or(meta.chart_previous_close);

    Ok(PriceQuote::with_reference(
        symbol,
        price,
        reference,
        meta.currency,
        asset_class,
    ))
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

pub struct YahooSource {
    http: Client,
    base_url: String,
    asset_class: AssetClass,
}

impl YahooSource {
    fn build(cfg: &PricesConfig, asset_class: AssetClass) -> Result<Self> {
        let http = Client::builder()
            .timeout(cfg.timeout())
            .user_agent(cfg.user_agent.as_str())
            .build()
            .context("Failed to build HTTP client for Yahoo Finance")?;

        Ok(Self {
            http,
            base_url: cfg.yahoo_base_url.trim_end_matches('/').to_string(),
            asset_class,
        })
    }

    pub fn stocks(cfg: &PricesConfig) -> Result<Self> {
        Self::build(cfg, AssetClass::Stock)
    }

    pub fn commodities(cfg: &PricesConfig) -> Result<Self> {
        Self::build(cfg, AssetClass::Commodity)
    }

    /// Symbol actually sent to Yahoo.
    fn upstream_symbol(&self, symbol: &str) -> Result<String, PriceError> {
        match self.asset_class {
            AssetClass::Commodity => commodity_symbol(symbol)
                .map(str::to_string)
                .ok_or_else(|| PriceError::UnsupportedSymbol {
                    symbol: symbol.to_string(),
                    supported: table_keys(COMMODITY_SYMBOLS),
                }),
            _ => Ok(symbol.to_string()),
        }
    }
}

#[async_trait]
impl PriceSource for YahooSource {
    fn asset_class(&self) -> AssetClass {
        self.asset_class
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<PriceQuote, PriceError> {
        let upstream = self.upstream_symbol(symbol)?;
        let url = format!(
            "{}/v8/finance/chart/{}?interval=1d&range=1d",
            self.base_url,
            urlencoding::encode(&upstream),
        );

        debug!(url = %url, "Fetching Yahoo chart");

        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(PriceError::NotFound(symbol.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PriceError::Upstream(format!("Yahoo API error {status}: {body}")));
        }

        let body: ChartResponse = resp.json().await?;
        quote_from_chart(symbol, body, self.asset_class)
    }

    fn name(&self) -> &'static str {
        "yahoo"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

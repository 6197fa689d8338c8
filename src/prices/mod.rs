//! Live price lookups.
//!
//! Defines the `PriceSource` trait with two upstream implementations:
//! - Yahoo Finance chart API: stocks and commodity futures
//! - CoinGecko simple-price API: crypto
//!
//! `PriceRouter` picks a source per symbol and turns manual entries
//! (ticker, shares, purchase price) into priced holdings.

pub mod coingecko;
pub mod yahoo;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::PricesConfig;
use crate::error::{EntryError, ParseError, PriceError};
use crate::types::{AssetClass, HoldingInput, PriceQuote};

// ---------------------------------------------------------------------------
// Symbol tables
// ---------------------------------------------------------------------------

/// Crypto ticker → CoinGecko coin id.
pub const CRYPTO_IDS: &[(&str, &str)] = &[
    ("BTC", "bitcoin"),
    ("ETH", "ethereum"),
    ("SOL", "solana"),
    ("DOGE", "dogecoin"),
    ("ADA", "cardano"),
    ("XRP", "ripple"),
    ("DOT", "polkadot"),
    ("MATIC", "matic-network"),
    ("LINK", "chainlink"),
    ("AVAX", "avalanche-2"),
    ("SHIB", "shiba-inu"),
    ("LTC", "litecoin"),
    ("UNI", "uniswap"),
    ("ATOM", "cosmos"),
    ("XLM", "stellar"),
    ("ALGO", "algorand"),
    ("VET", "vechain"),
    ("FTM", "fantom"),
    ("SAND", "the-sandbox"),
    ("MANA", "decentraland"),
    ("APE", "apecoin"),
    ("PEPE", "pepe"),
    ("ARB", "arbitrum"),
    ("OP", "optimism"),
];

/// Commodity name → Yahoo futures symbol.
pub const COMMODITY_SYMBOLS: &[(&str, &str)] = &[
    ("GOLD", "GC=F"),
    ("SILVER", "SI=F"),
    ("OIL", "CL=F"),
    ("NATGAS", "NG=F"),
    ("COPPER", "HG=F"),
    ("WHEAT", "ZW=F"),
    ("CORN", "ZC=F"),
    ("PLATINUM", "PL=F"),
    ("PALLADIUM", "PA=F"),
    ("SOYBEAN", "ZS=F"),
];

fn lookup(table: &'static [(&'static str, &'static str)], symbol: &str) -> Option<&'static str> {
    let upper = symbol.trim().to_uppercase();
    table.iter().find(|(k, _)| *k == upper).map(|(_, v)| *v)
}

fn table_keys(table: &[(&str, &str)]) -> String {
    table.iter().map(|(k, _)| *k).collect::<Vec<_>>().join(", ")
}

/// CoinGecko id for a crypto ticker (case-insensitive).
pub fn crypto_id(symbol: &str) -> Option<&'static str> {
    lookup(CRYPTO_IDS, symbol)
}

/// Yahoo futures symbol for a commodity name (case-insensitive).
pub fn commodity_symbol(symbol: &str) -> Option<&'static str> {
    lookup(COMMODITY_SYMBOLS, symbol)
}

/// Tickers the manual-entry form prices as crypto. A subset of [`CRYPTO_IDS`].
pub const MANUAL_CRYPTO_SYMBOLS: &[&str] = &[
    "BTC", "ETH", "SOL", "DOGE", "ADA", "XRP", "DOT", "MATIC", "LINK", "AVAX", "SHIB", "LTC",
    "UNI", "ATOM", "PEPE", "ARB", "OP",
];

/// Source for a typed-in ticker: crypto for [`MANUAL_CRYPTO_SYMBOLS`], stock
/// otherwise. Commodities are only quoted through an explicit commodity lookup.
pub fn manual_entry_class(symbol: &str) -> AssetClass {
    let upper = symbol.trim().to_uppercase();
    if MANUAL_CRYPTO_SYMBOLS.contains(&upper.as_str()) {
        AssetClass::Crypto
    } else {
        AssetClass::Stock
    }
}

/// Trim and uppercase a user-supplied symbol, rejecting blanks.
pub fn normalize_symbol(symbol: &str) -> Result<String, PriceError> {
    let s = symbol.trim().to_uppercase();
    if s.is_empty() {
        Err(PriceError::MissingSymbol)
    } else {
        Ok(s)
    }
}

// ---------------------------------------------------------------------------
// PriceSource trait
// ---------------------------------------------------------------------------

/// Abstraction over upstream price APIs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// The asset class this source quotes.
    fn asset_class(&self) -> AssetClass;

    /// Fetch the current quote for a user-facing symbol.
    async fn fetch_quote(&self, symbol: &str) -> Result<PriceQuote, PriceError>;

    /// Source name for logging.
    fn name(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// Manual entry
// ---------------------------------------------------------------------------

/// A holding typed in by hand; the current price is looked up live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualEntry {
    pub ticker: String,
    pub shares: f64,
    pub purchase_price: f64,
}

/// An entry that could not be priced, reported alongside the holdings that were.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryFailure {
    pub ticker: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualResolution {
    pub holdings: Vec<HoldingInput>,
    pub errors: Vec<EntryFailure>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Routes symbols to the right `PriceSource`.
#[derive(Clone)]
pub struct PriceRouter {
    stocks: Arc<dyn PriceSource>,
    crypto: Arc<dyn PriceSource>,
    commodities: Arc<dyn PriceSource>,
}

impl PriceRouter {
    pub fn new(
        stocks: Arc<dyn PriceSource>,
        crypto: Arc<dyn PriceSource>,
        commodities: Arc<dyn PriceSource>,
    ) -> Self {
        Self {
            stocks,
            crypto,
            commodities,
        }
    }

    /// Build the live Yahoo/CoinGecko router.
    pub fn from_config(cfg: &PricesConfig) -> Result<Self> {
        Ok(Self::new(
            Arc::new(yahoo::YahooSource::stocks(cfg)?),
            Arc::new(coingecko::CoinGeckoSource::new(cfg)?),
            Arc::new(yahoo::YahooSource::commodities(cfg)?),
        ))
    }

    pub fn source(&self, class: AssetClass) -> &dyn PriceSource {
        match class {
            AssetClass::Stock => self.stocks.as_ref(),
            AssetClass::Crypto => self.crypto.as_ref(),
            AssetClass::Commodity => self.commodities.as_ref(),
        }
    }

    /// Quote from an explicit source.
    pub async fn quote_as(&self, class: AssetClass, symbol: &str) -> Result<PriceQuote, PriceError> {
        let symbol = normalize_symbol(symbol)?;
        let source = self.source(class);
        debug!(symbol = %symbol, source = source.name(), "Fetching quote");
        source.fetch_quote(&symbol).await
    }

    /// Quote with the source picked by [`manual_entry_class`].
    pub async fn quote(&self, symbol: &str) -> Result<PriceQuote, PriceError> {
        self.quote_as(manual_entry_class(symbol), symbol).await
    }

    /// Validate a manual entry and price it.
    pub async fn build_holding(&self, entry: &ManualEntry) -> Result<HoldingInput, EntryError> {
        let ticker = entry.ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(ParseError::EmptyTicker.into());
        }
        // Validate everything but the price before spending a request
        HoldingInput::new(ticker.as_str(), entry.shares, entry.purchase_price, 0.0)?;

        let quote = self.quote(&ticker).await?;
        let holding = HoldingInput::new(ticker, entry.shares, entry.purchase_price, quote.price)?;
        Ok(holding)
    }

    /// Price all entries concurrently. Failures are collected, not fatal;
    /// successful holdings keep the input order.
    pub async fn build_holdings(&self, entries: &[ManualEntry]) -> ManualResolution {
        let results = join_all(entries.iter().map(|e| self.build_holding(e))).await;

        let mut resolution = ManualResolution::default();
        for (entry, result) in entries.iter().zip(results) {
            match result {
                Ok(holding) => resolution.holdings.push(holding),
                Err(e) => {
                    warn!(ticker = %entry.ticker, error = %e, "Manual entry failed");
                    resolution.errors.push(EntryFailure {
                        ticker: entry.ticker.trim().to_uppercase(),
                        error: e.to_string(),
                    });
                }
            }
        }
        resolution
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

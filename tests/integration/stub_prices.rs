//! Stub price source for integration testing.
//!
//! Provides a deterministic `PriceSource` that quotes from a fixed table
//! and records every symbol it was asked for. No network access.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use memefolio::error::PriceError;
use memefolio::prices::{PriceRouter, PriceSource};
use memefolio::types::{AssetClass, PriceQuote};

pub struct StubPrices {
    asset_class: AssetClass,
    prices: HashMap<String, f64>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl StubPrices {
    pub fn new(asset_class: AssetClass, prices: &[(&str, f64)]) -> Self {
        Self {
            asset_class,
            prices: prices.iter().map(|(s, p)| (s.to_string(), *p)).collect(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle to the call log, usable after the stub is moved into a router.
    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        self.calls.clone()
    }
}

#[async_trait]
impl PriceSource for StubPrices {
    fn asset_class(&self) -> AssetClass {
        self.asset_class
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<PriceQuote, PriceError> {
        self.calls.lock().unwrap().push(symbol.to_string());
        let price = self
            .prices
            .get(symbol)
            .copied()
            .ok_or_else(|| PriceError::NotFound(symbol.to_string()))?;
        Ok(PriceQuote::with_reference(
            symbol,
            price,
            None,
            Some("USD".to_string()),
            self.asset_class,
        ))
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Router over stub sources with a handful of known prices.
pub fn stub_router() -> (PriceRouter, Arc<Mutex<Vec<String>>>) {
    let stocks = StubPrices::new(
        AssetClass::Stock,
        &[("NVDA", 890.0), ("TSLA", 175.0), ("GME", 20.0)],
    );
    let calls = stocks.calls();
    let router = PriceRouter::new(
        Arc::new(stocks),
        Arc::new(StubPrices::new(AssetClass::Crypto, &[("DOGE", 0.08)])),
        Arc::new(StubPrices::new(AssetClass::Commodity, &[("GOLD", 2300.0)])),
    );
    (router, calls)
}

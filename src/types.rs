//! Shared types for MEMEFOLIO.
//!
//! These types form the data model used across all modules.
//! Holdings and results are plain data; the classifiers, price sources
//! and stores only ever exchange these structs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ParseError;

// ---------------------------------------------------------------------------
// Holdings
// ---------------------------------------------------------------------------

/// A single position as entered by the user (CSV row, manual entry or sample).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingInput {
    pub ticker: String,
    pub shares: f64,
    pub purchase_price: f64,
    pub current_price: f64,
}

impl HoldingInput {
    /// Build a validated holding.
    ///
    /// Ticker must be non-empty, shares finite and > 0, prices finite and >= 0.
    pub fn new(
        ticker: impl Into<String>,
        shares: f64,
        purchase_price: f64,
        current_price: f64,
    ) -> Result<Self, ParseError> {
        let holding = Self {
            ticker: ticker.into().trim().to_string(),
            shares,
            purchase_price,
            current_price,
        };
        holding.validate()?;
        Ok(holding)
    }

    /// Check the invariants of an already constructed holding
    /// (e.g. one deserialized from a request body).
    pub fn validate(&self) -> Result<(), ParseError> {
        if self.ticker.trim().is_empty() {
            return Err(ParseError::EmptyTicker);
        }
        if !self.shares.is_finite() || self.shares <= 0.0 {
            return Err(ParseError::InvalidHolding {
                ticker: self.ticker.clone(),
                field: "shares",
                value: self.shares,
            });
        }
        for (field, value) in [
            ("purchasePrice", self.purchase_price),
            ("currentPrice", self.current_price),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ParseError::InvalidHolding {
                    ticker: self.ticker.clone(),
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for HoldingInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} x{} @ ${:.2} (now ${:.2})",
            self.ticker, self.shares, self.purchase_price, self.current_price,
        )
    }
}

/// Per-holding gain/loss metrics derived from a [`HoldingInput`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingResult {
    pub ticker: String,
    pub shares: f64,
    pub invested: f64,
    pub current_value: f64,
    pub gain: f64,
    pub percentage_gain: f64,
}

impl HoldingResult {
    /// Whether the holding is flat or up.
    pub fn is_gain(&self) -> bool {
        self.percentage_gain >= 0.0
    }
}

impl fmt::Display for HoldingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (${:.2} -> ${:.2})",
            self.ticker,
            format_signed_percent(self.percentage_gain),
            self.invested,
            self.current_value,
        )
    }
}

/// Aggregate gain/loss metrics for a whole portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioResult {
    pub total_invested: f64,
    pub current_value: f64,
    pub total_return: f64,
    pub percentage_return: f64,
    /// Same order as the input holdings.
    pub holdings: Vec<HoldingResult>,
}

impl PortfolioResult {
    /// Holdings sorted best to worst by percentage gain.
    pub fn ranked_holdings(&self) -> Vec<&HoldingResult> {
        let mut ranked: Vec<&HoldingResult> = self.holdings.iter().collect();
        ranked.sort_by(|a, b| b.percentage_gain.total_cmp(&a.percentage_gain));
        ranked
    }
}

impl fmt::Display for PortfolioResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} holdings | invested ${:.2} | value ${:.2} | {}",
            self.holdings.len(),
            self.total_invested,
            self.current_value,
            format_signed_percent(self.percentage_return),
        )
    }
}

/// Render a percentage with an explicit sign and one decimal, e.g. `+12.3%`.
pub fn format_signed_percent(value: f64) -> String {
    if value >= 0.0 {
        format!("+{value:.1}%")
    } else {
        format!("{value:.1}%")
    }
}

// ---------------------------------------------------------------------------
// Meme templates
// ---------------------------------------------------------------------------

/// A meme image with the return range it is meant for and its caption patterns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemeTemplate {
    pub id: String,
    pub name: String,
    pub url: String,
    /// Inclusive lower bound of the percentage return range.
    pub min_return: f64,
    /// Exclusive upper bound of the percentage return range.
    pub max_return: f64,
    pub top_text: String,
    pub bottom_text: String,
}

impl MemeTemplate {
    /// Whether `percentage_return` falls in `[min_return, max_return)`.
    pub fn contains(&self, percentage_return: f64) -> bool {
        percentage_return >= self.min_return && percentage_return < self.max_return
    }

    /// Distance from `percentage_return` to this template's range (0 when inside).
    pub fn distance_to(&self, percentage_return: f64) -> f64 {
        if percentage_return < self.min_return {
            self.min_return - percentage_return
        } else if percentage_return >= self.max_return {
            percentage_return - self.max_return
        } else {
            0.0
        }
    }
}

// ---------------------------------------------------------------------------
// Prices
// ---------------------------------------------------------------------------

/// Which upstream a symbol is priced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Stock,
    Crypto,
    Commodity,
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetClass::Stock => write!(f, "stock"),
            AssetClass::Crypto => write!(f, "crypto"),
            AssetClass::Commodity => write!(f, "commodity"),
        }
    }
}

/// A current price as returned by one of the price proxies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub symbol: String,
    pub price: f64,
    /// Previous close for Yahoo symbols; absent for CoinGecko.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub asset_class: AssetClass,
}

impl PriceQuote {
    /// Build a quote from a price and its reference (previous close),
    /// deriving change and change percent.
    pub fn with_reference(
        symbol: impl Into<String>,
        price: f64,
        reference_price: Option<f64>,
        currency: Option<String>,
        asset_class: AssetClass,
    ) -> Self {
        let change = reference_price.map(|r| price - r);
        let change_percent = reference_price
            .filter(|r| *r != 0.0)
            .map(|r| (price - r) / r * 100.0);
        Self {
            symbol: symbol.into(),
            price,
            reference_price,
            change,
            change_percent,
            currency,
            asset_class,
        }
    }
}

impl fmt::Display for PriceQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ${:.2}", self.asset_class, self.symbol, self.price)?;
        if let Some(pct) = self.change_percent {
            write!(f, " ({})", format_signed_percent(pct))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Persisted records
// ---------------------------------------------------------------------------

/// A named portfolio saved for later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPortfolio {
    pub id: String,
    pub name: String,
    pub holdings: Vec<HoldingInput>,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    pub updated_at: i64,
}

/// One loss in the Hall of Shame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub id: String,
    pub percentage_loss: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meme_text: Option<String>,
}

impl fmt::Display for LeaderboardEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.percentage_loss)?;
        if let Some(ticker) = &self.ticker {
            write!(f, " {ticker}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

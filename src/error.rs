//! Domain error types.
//!
//! Plumbing (config, storage I/O, HTTP client setup) uses `anyhow`;
//! the enums here are the errors callers are expected to match on.

use thiserror::Error;

/// A holding or CSV row that could not be turned into a valid [`HoldingInput`].
///
/// [`HoldingInput`]: crate::types::HoldingInput
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("ticker must not be empty")]
    EmptyTicker,

    #[error("invalid {field} for {ticker}: {value}")]
    InvalidHolding {
        ticker: String,
        field: &'static str,
        value: f64,
    },

    /// `row` is the 1-based index of the data row (header excluded).
    #[error("row {row}: column {field} is not a number: {value:?}")]
    InvalidNumber {
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Failure to obtain a price from an upstream price API.
#[derive(Debug, Error)]
pub enum PriceError {
    #[error("missing symbol")]
    MissingSymbol,

    /// Symbol absent from the static lookup table of the source.
    #[error("{symbol} is not supported. Try: {supported}")]
    UnsupportedSymbol { symbol: String, supported: String },

    #[error("no price data found for {0}")]
    NotFound(String),

    #[error("upstream request failed: {0}")]
    Upstream(String),
}

impl From<reqwest::Error> for PriceError {
    fn from(e: reqwest::Error) -> Self {
        PriceError::Upstream(e.to_string())
    }
}

/// A manually-entered holding that could not be priced.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error(transparent)]
    Invalid(#[from] ParseError),

    #[error(transparent)]
    Price(#[from] PriceError),
}

/// Failure to proxy a meme image.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("missing url")]
    MissingUrl,

    #[error("only {0} images are allowed")]
    ForeignHost(String),

    #[error("image fetch failed: {0}")]
    Upstream(String),
}

impl From<reqwest::Error> for ImageError {
    fn from(e: reqwest::Error) -> Self {
        ImageError::Upstream(e.to_string())
    }
}

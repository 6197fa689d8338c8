//! Portfolio aggregation: per-holding and total gain/loss.
//!
//! Pure functions only. Percentages are never rounded here; rounding is a
//! display concern handled by [`format_signed_percent`].
//!
//! [`format_signed_percent`]: crate::types::format_signed_percent

pub mod normalize;
pub mod wrapped;

use tracing::debug;

use crate::types::{HoldingInput, HoldingResult, PortfolioResult};

/// Percentage of `gain` over `invested`, defined as 0 when nothing was invested.
pub fn percentage_of(gain: f64, invested: f64) -> f64 {
    if invested > 0.0 {
        gain / invested * 100.0
    } else {
        0.0
    }
}

/// Compute gain/loss metrics for a single holding.
pub fn evaluate_holding(row: &HoldingInput) -> HoldingResult {
    let invested = row.shares * row.purchase_price;
    let current_value = row.shares * row.current_price;
    let gain = current_value - invested;

    HoldingResult {
        ticker: row.ticker.clone(),
        shares: row.shares,
        invested,
        current_value,
        gain,
        percentage_gain: percentage_of(gain, invested),
    }
}

/// Aggregate a list of holdings into a [`PortfolioResult`].
///
/// Holdings keep their input order. An empty slice yields all-zero totals.
pub fn aggregate(rows: &[HoldingInput]) -> PortfolioResult {
    let holdings: Vec<HoldingResult> = rows.iter().map(evaluate_holding).collect();

    let total_invested: f64 = holdings.iter().map(|h| h.invested).sum();
    let current_value: f64 = holdings.iter().map(|h| h.current_value).sum();
    let total_return = current_value - total_invested;
    let percentage_return = percentage_of(total_return, total_invested);

    debug!(
        holdings = holdings.len(),
        total_invested,
        current_value,
        percentage_return,
        "Portfolio aggregated"
    );

    PortfolioResult {
        total_invested,
        current_value,
        total_return,
        percentage_return,
        holdings,
    }
}

/// The built-in "try it" portfolio.
pub fn sample_portfolio() -> Vec<HoldingInput> {
    [
        ("NVDA", 10.0, 450.0, 890.0),
        ("AAPL", 25.0, 142.5, 178.25),
        ("MSFT", 15.0, 285.0, 415.5),
        ("TSLA", 8.0, 265.0, 175.0),
        ("META", 12.0, 180.0, 485.0),
        ("AMD", 20.0, 95.0, 158.0),
    ]
    .into_iter()
    .map(|(ticker, shares, purchase_price, current_price)| HoldingInput {
        ticker: ticker.to_string(),
        shares,
        purchase_price,
        current_price,
    })
    .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

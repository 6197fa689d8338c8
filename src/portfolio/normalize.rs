//! CSV row normalization.
//!
//! Spreadsheet exports name their columns in many ways. Each holding field
//! is resolved from an ordered list of candidate headers ([`ColumnAliases`]);
//! the first present, non-empty value wins.
//!
//! Rows without a ticker or with non-positive shares are dropped silently.
//! The lenient path reads the leading number of each cell and coerces the
//! rest to 0; the strict path reports anything that is not wholly a number
//! as [`ParseError::InvalidNumber`].

use std::collections::HashMap;
use std::io;

use csv::{ReaderBuilder, Trim};
use tracing::debug;

use crate::error::ParseError;
use crate::types::HoldingInput;

/// A header-keyed CSV row.
pub type RawRow = HashMap<String, String>;

// ---------------------------------------------------------------------------
// Column aliases
// ---------------------------------------------------------------------------

/// Candidate column names per holding field, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnAliases {
    pub ticker: &'static [&'static str],
    pub shares: &'static [&'static str],
    pub purchase_price: &'static [&'static str],
    pub current_price: &'static [&'static str],
}

pub const DEFAULT_ALIASES: ColumnAliases = ColumnAliases {
    ticker: &["ticker", "Ticker", "symbol", "Symbol"],
    shares: &["shares", "Shares", "quantity", "Quantity"],
    purchase_price: &[
        "purchasePrice",
        "PurchasePrice",
        "purchase_price",
        "cost",
        "Cost",
    ],
    current_price: &[
        "currentPrice",
        "CurrentPrice",
        "current_price",
        "price",
        "Price",
    ],
};

impl Default for ColumnAliases {
    fn default() -> Self {
        DEFAULT_ALIASES
    }
}

/// First non-empty value among `keys`, trimmed.
pub fn resolve<'a>(row: &'a RawRow, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| row.get(*k))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
}

fn parse_number(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Longest leading decimal number in `value`, so `"25 shares"` reads as 25
/// and `"142.5 USD"` as 142.5. `None` when there is no leading number.
fn parse_leading_number(value: &str) -> Option<f64> {
    let bytes = value.trim_start().as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - (end + 1);
        end = frac_end;
    }
    if mantissa_digits == 0 {
        return None;
    }

    // An exponent only counts when it has digits of its own
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    std::str::from_utf8(&bytes[..end]).ok().and_then(parse_number)
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Lenient normalization with the default aliases.
pub fn normalize(rows: &[RawRow]) -> Vec<HoldingInput> {
    normalize_with(rows, &DEFAULT_ALIASES)
}

/// Lenient normalization: numbers are read from their leading numeric
/// prefix; missing or prefix-less values become 0.
pub fn normalize_with(rows: &[RawRow], aliases: &ColumnAliases) -> Vec<HoldingInput> {
    let number = |row: &RawRow, keys: &[&str]| {
        resolve(row, keys)
            .and_then(parse_leading_number)
            .unwrap_or(0.0)
    };

    let holdings: Vec<HoldingInput> = rows
        .iter()
        .map(|row| HoldingInput {
            ticker: resolve(row, aliases.ticker).unwrap_or_default().to_string(),
            shares: number(row, aliases.shares),
            purchase_price: number(row, aliases.purchase_price),
            current_price: number(row, aliases.current_price),
        })
        .filter(|h| !h.ticker.is_empty() && h.shares > 0.0)
        .collect();

    debug!(
        rows = rows.len(),
        kept = holdings.len(),
        "Normalized CSV rows (lenient)"
    );
    holdings
}

/// Strict normalization with the default aliases.
pub fn normalize_strict(rows: &[RawRow]) -> Result<Vec<HoldingInput>, ParseError> {
    normalize_strict_with(rows, &DEFAULT_ALIASES)
}

/// Strict normalization: a present but non-numeric value is an error.
///
/// Rows without a ticker are still dropped silently (before any number is
/// parsed), as are rows whose shares parse to a non-positive value.
pub fn normalize_strict_with(
    rows: &[RawRow],
    aliases: &ColumnAliases,
) -> Result<Vec<HoldingInput>, ParseError> {
    let mut holdings = Vec::with_capacity(rows.len());

    for (idx, row) in rows.iter().enumerate() {
        let row_number = idx + 1;
        let Some(ticker) = resolve(row, aliases.ticker) else {
            continue;
        };

        let number = |keys: &[&str], field: &'static str| -> Result<f64, ParseError> {
            match resolve(row, keys) {
                None => Ok(0.0),
                Some(raw) => parse_number(raw).ok_or_else(|| ParseError::InvalidNumber {
                    row: row_number,
                    field,
                    value: raw.to_string(),
                }),
            }
        };

        let shares = number(aliases.shares, "shares")?;
        if shares <= 0.0 {
            continue;
        }

        let holding = HoldingInput {
            ticker: ticker.to_string(),
            shares,
            purchase_price: number(aliases.purchase_price, "purchasePrice")?,
            current_price: number(aliases.current_price, "currentPrice")?,
        };
        holding.validate()?;
        holdings.push(holding);
    }

    debug!(
        rows = rows.len(),
        kept = holdings.len(),
        "Normalized CSV rows (strict)"
    );
    Ok(holdings)
}

// ---------------------------------------------------------------------------
// CSV reading
// ---------------------------------------------------------------------------

/// Read a header-based CSV document into raw rows.
///
/// Values are trimmed and short rows allowed (their missing columns are
/// simply absent from the map). Empty lines are skipped by the reader, but
/// all-blank records like `,,` are kept so row indices match the sheet;
/// normalization drops them for lacking a ticker.
pub fn read_rows<R: io::Read>(reader: R) -> Result<Vec<RawRow>, ParseError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mut rows = Vec::new();

    for record in rdr.records() {
        let record = record?;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

/// Parse CSV text and normalize it leniently.
pub fn parse_csv(text: &str) -> Result<Vec<HoldingInput>, ParseError> {
    let rows = read_rows(text.as_bytes())?;
    Ok(normalize(&rows))
}

/// Parse CSV text and normalize it strictly.
pub fn parse_csv_strict(text: &str) -> Result<Vec<HoldingInput>, ParseError> {
    let rows = read_rows(text.as_bytes())?;
    normalize_strict(&rows)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::aggregate;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_aliases_symbol_quantity_cost_price() {
        let rows = vec![row(&[
            ("Symbol", "AAPL"),
            ("Quantity", "25"),
            ("cost", "142.5"),
            ("price", "178.25"),
        ])];
        let holdings = normalize(&rows);
        assert_eq!(
            holdings,
            vec![HoldingInput {
                ticker: "AAPL".into(),
                shares: 25.0,
                purchase_price: 142.5,
                current_price: 178.25,
            }]
        );
    }

    #[test]
    fn test_alias_priority() {
        let rows = vec![row(&[
            ("ticker", "MSFT"),
            ("Symbol", "IGNORED"),
            ("shares", "3"),
            ("Quantity", "99"),
            ("purchasePrice", "10"),
            ("cost", "20"),
            ("currentPrice", "11"),
            ("Price", "30"),
        ])];
        let h = &normalize(&rows)[0];
        assert_eq!(h.ticker, "MSFT");
        assert_eq!(h.shares, 3.0);
        assert_eq!(h.purchase_price, 10.0);
        assert_eq!(h.current_price, 11.0);
    }

    #[test]
    fn test_empty_alias_falls_through() {
        let rows = vec![row(&[("ticker", ""), ("Symbol", "GME"), ("shares", ""), ("Quantity", "4")])];
        let h = &normalize(&rows)[0];
        assert_eq!(h.ticker, "GME");
        assert_eq!(h.shares, 4.0);
        assert_eq!(h.purchase_price, 0.0);
        assert_eq!(h.current_price, 0.0);
    }

    #[test]
    fn test_missing_ticker_dropped() {
        let rows = vec![
            row(&[("shares", "10"), ("price", "5")]),
            row(&[("ticker", "AMD"), ("shares", "1")]),
        ];
        let holdings = normalize(&rows);
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].ticker, "AMD");
    }

    #[test]
    fn test_non_positive_shares_dropped() {
        let rows = vec![
            row(&[("ticker", "ZERO"), ("shares", "0"), ("cost", "10")]),
            row(&[("ticker", "NEG"), ("shares", "-2")]),
            row(&[("ticker", "JUNK"), ("shares", "lots")]),
            row(&[("ticker", "OK"), ("shares", "2"), ("cost", "10"), ("price", "15")]),
        ];
        let holdings = normalize(&rows);
        assert_eq!(holdings.len(), 1);

        let summary = aggregate(&holdings);
        assert_eq!(summary.total_invested, 20.0);
        assert_eq!(summary.current_value, 30.0);
        assert!((summary.percentage_return - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_unparseable_price_is_zero_when_lenient() {
        let rows = vec![row(&[("ticker", "X"), ("shares", "1"), ("cost", "n/a"), ("price", "NaN")])];
        let h = &normalize(&rows)[0];
        assert_eq!(h.purchase_price, 0.0);
        assert_eq!(h.current_price, 0.0);
    }

    #[test]
    fn test_lenient_reads_leading_number() {
        let rows = vec![row(&[
            ("ticker", "AAPL"),
            ("shares", "25 shares"),
            ("cost", "142.5 USD"),
            ("price", "178.25"),
        ])];
        assert_eq!(
            normalize(&rows),
            vec![HoldingInput {
                ticker: "AAPL".into(),
                shares: 25.0,
                purchase_price: 142.5,
                current_price: 178.25,
            }]
        );
    }

    #[test]
    fn test_parse_leading_number() {
        assert_eq!(parse_leading_number("1,234"), Some(1.0));
        assert_eq!(parse_leading_number("-3.5x"), Some(-3.5));
        assert_eq!(parse_leading_number(".5"), Some(0.5));
        assert_eq!(parse_leading_number("2e3 units"), Some(2000.0));
        assert_eq!(parse_leading_number("7e"), Some(7.0));
        assert_eq!(parse_leading_number("$12"), None);
        assert_eq!(parse_leading_number("-"), None);
        assert_eq!(parse_leading_number("."), None);
        assert_eq!(parse_leading_number("Infinity"), None);
        assert_eq!(parse_leading_number("1e999"), None);
    }

    #[test]
    fn test_strict_rejects_trailing_text() {
        let rows = vec![row(&[("ticker", "AAPL"), ("shares", "25 shares")])];
        assert!(matches!(
            normalize_strict(&rows),
            Err(ParseError::InvalidNumber { row: 1, field: "shares", .. })
        ));
    }

    #[test]
    fn test_strict_reports_bad_number() {
        let rows = vec![
            row(&[("ticker", "A"), ("shares", "1"), ("cost", "1"), ("price", "1")]),
            row(&[("ticker", "B"), ("shares", "1"), ("cost", "abc"), ("price", "1")]),
        ];
        match normalize_strict(&rows) {
            Err(ParseError::InvalidNumber { row, field, value }) => {
                assert_eq!(row, 2);
                assert_eq!(field, "purchasePrice");
                assert_eq!(value, "abc");
            }
            other => panic!("expected InvalidNumber, got {other:?}"),
        }
    }

    #[test]
    fn test_strict_still_drops_silently() {
        let rows = vec![
            row(&[("shares", "not-a-number")]),
            row(&[("ticker", "Z"), ("shares", "0")]),
            row(&[("ticker", "OK"), ("shares", "1"), ("cost", "2"), ("price", "3")]),
        ];
        let holdings = normalize_strict(&rows).unwrap();
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].ticker, "OK");
    }

    #[test]
    fn test_strict_rejects_negative_price() {
        let rows = vec![row(&[("ticker", "A"), ("shares", "1"), ("cost", "-5")])];
        assert!(matches!(
            normalize_strict(&rows),
            Err(ParseError::InvalidHolding { field: "purchasePrice", .. })
        ));
    }

    #[test]
    fn test_read_rows_trims_and_skips_blank_lines() {
        let text = "Symbol, Quantity ,cost,price\n AAPL ,25,142.5,178.25\n\nTSLA,8,265,175\n";
        let rows = read_rows(text.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Symbol"], "AAPL");
        assert_eq!(rows[0]["Quantity"], "25");
    }

    #[test]
    fn test_parse_csv_end_to_end() {
        let text = "ticker,shares,purchasePrice,currentPrice\n\
                    NVDA,10,450,890\n\
                    ,5,1,1\n\
                    TSLA,8,265,175\n";
        let holdings = parse_csv(text).unwrap();
        assert_eq!(holdings.len(), 2);
        assert_eq!(holdings[0].ticker, "NVDA");
        assert_eq!(holdings[1].ticker, "TSLA");
    }

    #[test]
    fn test_parse_csv_short_rows() {
        let text = "ticker,shares,cost,price\nAMD,20\n";
        let holdings = parse_csv(text).unwrap();
        assert_eq!(holdings[0].shares, 20.0);
        assert_eq!(holdings[0].current_price, 0.0);
    }

    #[test]
    fn test_blank_record_keeps_row_numbers() {
        let text = "ticker,shares,cost\n,,\nAMD,twenty,1\n";
        let rows = read_rows(text.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(parse_csv(text).unwrap().is_empty());
        assert!(matches!(
            parse_csv_strict(text),
            Err(ParseError::InvalidNumber { row: 2, field: "shares", .. })
        ));
    }

    #[test]
    fn test_parse_csv_strict_error() {
        let text = "ticker,shares\nAMD,twenty\n";
        assert!(matches!(
            parse_csv_strict(text),
            Err(ParseError::InvalidNumber { row: 1, field: "shares", .. })
        ));
    }
}

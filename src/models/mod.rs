//! Shared models for the ticker pipeline.
//!
//! Contains the exchange-agnostic [`TickerRecord`], the intermediate
//! [`TickerUpdate`] produced by wire parsers, market-name lookups, and one
//! wire-model submodule per exchange.

pub mod binance;
pub mod bithumb;
pub mod sentiment;
pub mod ticker;
pub mod upbit;

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

pub use sentiment::{MarketSentiment, SentimentLevel};
pub use ticker::{Direction, RecordLabels, TickerRecord, TickerUpdate};

/// Supported exchanges, in menu order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExchangeKind {
    Bithumb,
    Upbit,
    Binance,
}

impl ExchangeKind {
    /// All exchanges in menu order.
    pub const ALL: [ExchangeKind; 3] = [Self::Bithumb, Self::Upbit, Self::Binance];

    /// Returns the display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bithumb => "Bithumb",
            Self::Upbit => "Upbit",
            Self::Binance => "Binance",
        }
    }

    /// Returns the exchange bound to a 1-based menu key, if any.
    pub fn from_menu_index(index: usize) -> Option<Self> {
        index
            .checked_sub(1)
            .and_then(|i| Self::ALL.get(i))
            .copied()
    }

    /// Parses a case-insensitive exchange name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Human-readable market names keyed by canonical symbol (`BTC_KRW`).
pub type MarketNames = HashMap<String, String>;

/// One entry of the `/v1/market/all` listing shared by Bithumb and Upbit.
#[derive(Clone, Debug, Deserialize)]
pub struct MarketInfo {
    /// `QUOTE-BASE` market code, e.g. `KRW-BTC`.
    pub market: String,
    #[serde(default)]
    pub korean_name: Option<String>,
    #[serde(default)]
    pub english_name: Option<String>,
}

/// A numeric wire field that some exchanges encode as a JSON string.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum WireNumber {
    Number(f64),
    Text(String),
}

impl WireNumber {
    /// Returns the finite value, or `None` for unparseable or non-finite input.
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Number(n) => finite(Some(*n)),
            Self::Text(s) => parse_number(Some(s)),
        }
    }
}

/// Reads an optional wire number as a finite `f64`.
pub fn wire_value(field: &Option<WireNumber>) -> Option<f64> {
    field.as_ref().and_then(WireNumber::value)
}

/// Converts a dash-separated `QUOTE-BASE` market code (`KRW-BTC`) into the
/// canonical `BASE_QUOTE` form (`BTC_KRW`).
pub fn canonical_from_quote_base(code: &str) -> Option<String> {
    let (quote, base) = code.split_once('-')?;
    if quote.is_empty() || base.is_empty() {
        return None;
    }
    Some(format!("{base}_{quote}"))
}

/// Parses a string-encoded number, treating absent, empty, and non-finite
/// values as unknown.
pub fn parse_number(value: Option<&str>) -> Option<f64> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Drops non-finite numbers so `NaN` never leaks into a record.
pub fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_index_is_one_based() {
        assert_eq!(ExchangeKind::from_menu_index(0), None);
        assert_eq!(ExchangeKind::from_menu_index(1), Some(ExchangeKind::Bithumb));
        assert_eq!(ExchangeKind::from_menu_index(3), Some(ExchangeKind::Binance));
        assert_eq!(ExchangeKind::from_menu_index(4), None);
    }

    #[test]
    fn exchange_names_parse_case_insensitively() {
        assert_eq!(ExchangeKind::from_name("upbit"), Some(ExchangeKind::Upbit));
        assert_eq!(ExchangeKind::from_name("BINANCE"), Some(ExchangeKind::Binance));
        assert_eq!(ExchangeKind::from_name("kraken"), None);
    }

    #[test]
    fn canonical_symbol_from_market_code() {
        assert_eq!(canonical_from_quote_base("KRW-BTC").as_deref(), Some("BTC_KRW"));
        assert_eq!(canonical_from_quote_base("BTC-ETH").as_deref(), Some("ETH_BTC"));
        assert_eq!(canonical_from_quote_base("KRW"), None);
        assert_eq!(canonical_from_quote_base("-BTC"), None);
    }

    #[test]
    fn wire_numbers_accept_strings_and_numbers() {
        let text: WireNumber = serde_json::from_str(r#""97500000""#).unwrap();
        let number: WireNumber = serde_json::from_str("0.025").unwrap();
        let junk: WireNumber = serde_json::from_str(r#""n/a""#).unwrap();

        assert_eq!(text.value(), Some(97_500_000.0));
        assert_eq!(number.value(), Some(0.025));
        assert_eq!(junk.value(), None);
        assert_eq!(wire_value(&None), None);
    }

    #[test]
    fn parse_number_rejects_unknowns() {
        assert_eq!(parse_number(Some("2.5")), Some(2.5));
        assert_eq!(parse_number(Some(" -0.75 ")), Some(-0.75));
        assert_eq!(parse_number(Some("")), None);
        assert_eq!(parse_number(Some("NaN")), None);
        assert_eq!(parse_number(Some("inf")), None);
        assert_eq!(parse_number(Some("abc")), None);
        assert_eq!(parse_number(None), None);
    }
}

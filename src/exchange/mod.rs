//! Exchange adapters.
//!
//! Each exchange implements [`ExchangeProtocol`], which captures only its
//! wire specifics (endpoints, subscription shape, frame parsing). The
//! shared [`Adapter`] owns connection state and the per-exchange record
//! map on top of any protocol.
//!
//! - [`bithumb`] - Bithumb public ticker stream
//! - [`upbit`] - Upbit ticker stream (binary JSON frames)
//! - [`binance`] - Binance rolling 24h ticker stream
//! - [`adapter`] - Connection supervision and standardization

pub mod adapter;
pub mod binance;
pub mod bithumb;
pub mod upbit;

use std::sync::Arc;

use crate::Result;
use crate::config::{AppConfig, CoinConfig, non_empty_var};
use crate::models::{ExchangeKind, MarketInfo, MarketNames, TickerUpdate, canonical_from_quote_base};

pub use adapter::{Adapter, ConnectionState, Outcome};
pub use binance::Binance;
pub use bithumb::Bithumb;
pub use upbit::Upbit;

/// A configured coin resolved against one exchange.
#[derive(Clone, Debug, PartialEq)]
pub struct Market {
    /// Canonical `BASE_QUOTE` symbol used as the record key.
    pub canonical: String,
    /// Symbol or code as the exchange expects it in subscriptions.
    pub wire: String,
    pub icon: String,
    /// Cost basis, only when the coin's own quote matches this market.
    pub cost_basis: Option<f64>,
}

impl Market {
    /// Binds a coin to an exchange-specific market.
    pub fn new(coin: &CoinConfig, canonical: String, wire: String) -> Self {
        let cost_basis = if coin.market() == canonical {
            coin.cost_basis()
        } else {
            None
        };
        Self {
            canonical,
            wire,
            icon: coin.icon.clone(),
            cost_basis,
        }
    }
}

/// Wire-level behaviour of one exchange.
///
/// Implementations are stateless apart from their endpoints, so the same
/// instance can be shared between the adapter and its session task.
pub trait ExchangeProtocol: Send + Sync {
    /// Which exchange this protocol speaks for.
    fn kind(&self) -> ExchangeKind;

    /// WebSocket endpoint.
    fn websocket_url(&self) -> &str;

    /// REST endpoint listing market display names, if the exchange has one.
    fn markets_url(&self) -> Option<&str> {
        None
    }

    /// Parses the market listing body into display names.
    ///
    /// # Errors
    ///
    /// Returns a [`TickerError`](crate::TickerError) if the body is not the
    /// expected JSON shape.
    fn parse_markets(&self, _body: &str) -> Result<MarketNames> {
        Ok(MarketNames::new())
    }

    /// Resolves a configured coin to this exchange's market.
    fn market(&self, coin: &CoinConfig) -> Market;

    /// Builds the single subscription message sent after the socket opens.
    ///
    /// # Errors
    ///
    /// Returns a [`TickerError`](crate::TickerError) if serialization fails.
    fn subscription(&self, markets: &[Market]) -> Result<String>;

    /// Parses one text frame.
    ///
    /// Returns `Ok(None)` for frames that are valid but carry no ticker
    /// (status, acknowledgements, other channels).
    ///
    /// # Errors
    ///
    /// Returns [`TickerError::MalformedMessage`](crate::TickerError::MalformedMessage)
    /// when the frame is not JSON or a ticker lacks its symbol or price.
    fn parse_frame(&self, text: &str) -> Result<Option<TickerUpdate>>;
}

/// Builds the protocol for an exchange, honouring `*_WEBSOCKET_URL`
/// environment overrides.
pub fn protocol_for(kind: ExchangeKind, config: &AppConfig) -> Arc<dyn ExchangeProtocol> {
    match kind {
        ExchangeKind::Bithumb => Arc::new(Bithumb::new(
            non_empty_var("BITHUMB_WEBSOCKET_URL")
                .unwrap_or_else(|| bithumb::DEFAULT_WEBSOCKET_URL.to_string()),
        )),
        ExchangeKind::Upbit => Arc::new(Upbit::new(
            non_empty_var("UPBIT_WEBSOCKET_URL")
                .unwrap_or_else(|| upbit::DEFAULT_WEBSOCKET_URL.to_string()),
        )),
        ExchangeKind::Binance => Arc::new(Binance::new(
            non_empty_var("BINANCE_WEBSOCKET_URL")
                .unwrap_or_else(|| binance::DEFAULT_WEBSOCKET_URL.to_string()),
            config.binance_quote.clone(),
        )),
    }
}

/// Parses the `/v1/market/all` listing shared by Bithumb and Upbit.
///
/// Korean names are preferred, English names are the fallback.
pub(crate) fn parse_market_listing(body: &str) -> Result<MarketNames> {
    let markets: Vec<MarketInfo> = serde_json::from_str(body)?;

    Ok(markets
        .into_iter()
        .filter_map(|m| {
            let name = m
                .korean_name
                .filter(|n| !n.is_empty())
                .or(m.english_name.filter(|n| !n.is_empty()))?;
            Some((canonical_from_quote_base(&m.market)?, name))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(symbol: &str, unit: &str, avg: f64) -> CoinConfig {
        CoinConfig {
            symbol: symbol.to_string(),
            icon: "*".to_string(),
            unit_currency: unit.to_string(),
            average_purchase_price: avg,
        }
    }

    #[test]
    fn cost_basis_only_binds_to_matching_quote() {
        let btc = coin("BTC", "KRW", 90_000_000.0);

        let krw = Market::new(&btc, "BTC_KRW".to_string(), "KRW-BTC".to_string());
        assert_eq!(krw.cost_basis, Some(90_000_000.0));
        assert_eq!(krw.icon, "*");

        let usdt = Market::new(&btc, "BTC_USDT".to_string(), "BTCUSDT".to_string());
        assert_eq!(usdt.cost_basis, None);
    }

    #[test]
    fn market_listing_prefers_korean_names() {
        let body = r#"[
            {"market": "KRW-BTC", "korean_name": "비트코인", "english_name": "Bitcoin"},
            {"market": "BTC-ETH", "korean_name": "", "english_name": "Ethereum"},
            {"market": "KRW-XRP"},
            {"market": "bogus", "korean_name": "무효"}
        ]"#;
        let names = parse_market_listing(body).unwrap();

        assert_eq!(names.get("BTC_KRW").map(String::as_str), Some("비트코인"));
        assert_eq!(names.get("ETH_BTC").map(String::as_str), Some("Ethereum"));
        assert!(!names.contains_key("XRP_KRW"));
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn market_listing_rejects_non_array() {
        assert!(parse_market_listing(r#"{"status": "5100"}"#).is_err());
    }
}

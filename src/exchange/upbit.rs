//! Upbit ticker stream.
//!
//! Upbit delivers frames as binary UTF-8 JSON; the session task forwards
//! them as text, so parsing here only sees strings.

use tracing::warn;

use super::{ExchangeProtocol, Market, parse_market_listing};
use crate::config::CoinConfig;
use crate::models::upbit::{UpbitErrorFrame, UpbitTicker, ticker_request};
use crate::models::{ExchangeKind, MarketNames, TickerUpdate, canonical_from_quote_base, wire_value};
use crate::{Result, TickerError};

/// Default public WebSocket endpoint.
pub const DEFAULT_WEBSOCKET_URL: &str = "wss://api.upbit.com/websocket/v1";

const MARKETS_URL: &str = "https://api.upbit.com/v1/market/all";

/// Upbit wire protocol.
pub struct Upbit {
    websocket_url: String,
}

impl Upbit {
    pub fn new(websocket_url: String) -> Self {
        Self { websocket_url }
    }
}

impl ExchangeProtocol for Upbit {
    fn kind(&self) -> ExchangeKind {
        ExchangeKind::Upbit
    }

    fn websocket_url(&self) -> &str {
        &self.websocket_url
    }

    fn markets_url(&self) -> Option<&str> {
        Some(MARKETS_URL)
    }

    fn parse_markets(&self, body: &str) -> Result<MarketNames> {
        parse_market_listing(body)
    }

    fn market(&self, coin: &CoinConfig) -> Market {
        let wire = format!(
            "{}-{}",
            coin.unit_currency.to_uppercase(),
            coin.symbol.to_uppercase()
        );
        Market::new(coin, coin.market(), wire)
    }

    fn subscription(&self, markets: &[Market]) -> Result<String> {
        let request = ticker_request(
            uuid::Uuid::new_v4().to_string(),
            markets.iter().map(|m| m.wire.clone()).collect(),
        );
        Ok(serde_json::to_string(&request)?)
    }

    fn parse_frame(&self, text: &str) -> Result<Option<TickerUpdate>> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| TickerError::MalformedMessage(e.to_string()))?;

        if value.get("error").is_some() {
            if let Ok(frame) = serde_json::from_value::<UpbitErrorFrame>(value) {
                warn!(
                    name = ?frame.error.name,
                    message = ?frame.error.message,
                    "Upbit rejected request"
                );
            }
            return Ok(None);
        }
        if value.get("type").and_then(|t| t.as_str()) != Some("ticker") {
            return Ok(None);
        }

        let ticker: UpbitTicker = serde_json::from_value(value)
            .map_err(|e| TickerError::MalformedMessage(e.to_string()))?;

        let symbol = canonical_from_quote_base(&ticker.code).ok_or_else(|| {
            TickerError::MalformedMessage(format!("unrecognized market code {}", ticker.code))
        })?;
        let current_price = wire_value(&ticker.trade_price).ok_or_else(|| {
            TickerError::MalformedMessage(format!("{}: missing trade_price", ticker.code))
        })?;

        Ok(Some(TickerUpdate {
            symbol,
            current_price,
            change_rate_pct: wire_value(&ticker.signed_change_rate).map(|r| r * 100.0),
            change_amount: wire_value(&ticker.signed_change_price),
            open_price: wire_value(&ticker.opening_price),
            high_price: wire_value(&ticker.high_price),
            low_price: wire_value(&ticker.low_price),
            prev_close_price: wire_value(&ticker.prev_closing_price),
            volume_power: None,
            trade_value: wire_value(&ticker.acc_trade_price_24h),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protocol() -> Upbit {
        Upbit::new(DEFAULT_WEBSOCKET_URL.to_string())
    }

    fn coin(symbol: &str) -> CoinConfig {
        CoinConfig {
            symbol: symbol.to_string(),
            icon: String::new(),
            unit_currency: "KRW".to_string(),
            average_purchase_price: 0.0,
        }
    }

    #[test]
    fn markets_use_quote_dash_base_codes() {
        let market = protocol().market(&coin("eth"));
        assert_eq!(market.wire, "KRW-ETH");
        assert_eq!(market.canonical, "ETH_KRW");
    }

    #[test]
    fn subscription_is_ticket_then_type() {
        let markets = vec![protocol().market(&coin("BTC")), protocol().market(&coin("XRP"))];
        let json = protocol().subscription(&markets).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let ticket = value[0]["ticket"].as_str().unwrap();
        assert!(uuid::Uuid::parse_str(ticket).is_ok());
        assert_eq!(value[1]["type"], "ticker");
        assert_eq!(value[1]["codes"][0], "KRW-BTC");
        assert_eq!(value[1]["codes"][1], "KRW-XRP");
    }

    #[test]
    fn parses_ticker_frame() {
        let frame = r#"{
            "type": "ticker",
            "code": "KRW-BTC",
            "opening_price": 97500000.0,
            "high_price": 101000000.0,
            "low_price": 98000000.0,
            "trade_price": 100000000.0,
            "prev_closing_price": 97500000.0,
            "change": "RISE",
            "signed_change_price": 2500000.0,
            "signed_change_rate": 0.025,
            "acc_trade_price_24h": 250000000000.0,
            "stream_type": "REALTIME",
            "market_warning": "NONE"
        }"#;
        let update = protocol().parse_frame(frame).unwrap().unwrap();

        assert_eq!(update.symbol, "BTC_KRW");
        assert_eq!(update.current_price, 100_000_000.0);
        assert_eq!(update.change_amount, Some(2_500_000.0));
        assert!((update.change_rate_pct.unwrap() - 2.5).abs() < 1e-9);
        assert_eq!(update.volume_power, None);
        assert_eq!(update.trade_value, Some(250_000_000_000.0));
    }

    #[test]
    fn error_and_foreign_frames_are_ignored() {
        let frame = r#"{"error":{"name":"INVALID_PARAM","message":"bad codes"}}"#;
        assert!(protocol().parse_frame(frame).unwrap().is_none());

        let frame = r#"{"type":"trade","code":"KRW-BTC","trade_price":1.0}"#;
        assert!(protocol().parse_frame(frame).unwrap().is_none());
    }

    #[test]
    fn ticker_without_price_is_malformed() {
        let frame = r#"{"type":"ticker","code":"KRW-BTC","signed_change_rate":0.01}"#;
        assert!(protocol().parse_frame(frame).is_err());

        let frame = r#"{"type":"ticker","code":"BTC","trade_price":1.0}"#;
        assert!(protocol().parse_frame(frame).is_err());
    }
}

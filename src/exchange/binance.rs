//! Binance spot rolling 24h ticker stream.
//!
//! Binance has no Korean market-name endpoint, so records display their
//! canonical symbol. Pairs are built against a single configured quote
//! asset.

use tracing::debug;

use super::{ExchangeProtocol, Market};
use crate::config::CoinConfig;
use crate::models::binance::{BinanceSubscribeRequest, BinanceTicker};
use crate::models::{ExchangeKind, TickerUpdate, wire_value};
use crate::{Result, TickerError};

/// Default public WebSocket endpoint.
pub const DEFAULT_WEBSOCKET_URL: &str = "wss://stream.binance.com:9443/ws";

/// Request id attached to the subscription.
const SUBSCRIBE_ID: u64 = 1;

/// Binance wire protocol.
pub struct Binance {
    websocket_url: String,
    quote: String,
}

impl Binance {
    pub fn new(websocket_url: String, quote: String) -> Self {
        Self {
            websocket_url,
            quote: quote.to_uppercase(),
        }
    }

    /// Maps `BTCUSDT` to `BTC_USDT`; unknown quotes keep the raw symbol.
    fn canonical(&self, symbol: &str) -> String {
        let symbol = symbol.to_uppercase();
        match symbol.strip_suffix(&self.quote) {
            Some(base) if !base.is_empty() => format!("{base}_{}", self.quote),
            _ => symbol,
        }
    }
}

impl ExchangeProtocol for Binance {
    fn kind(&self) -> ExchangeKind {
        ExchangeKind::Binance
    }

    fn websocket_url(&self) -> &str {
        &self.websocket_url
    }

    fn market(&self, coin: &CoinConfig) -> Market {
        let base = coin.symbol.to_uppercase();
        Market::new(
            coin,
            format!("{base}_{}", self.quote),
            format!("{base}{}", self.quote),
        )
    }

    fn subscription(&self, markets: &[Market]) -> Result<String> {
        let pairs: Vec<String> = markets.iter().map(|m| m.wire.clone()).collect();
        let request = BinanceSubscribeRequest::ticker(&pairs, SUBSCRIBE_ID);
        Ok(serde_json::to_string(&request)?)
    }

    fn parse_frame(&self, text: &str) -> Result<Option<TickerUpdate>> {
        let mut value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| TickerError::MalformedMessage(e.to_string()))?;

        if value.get("id").is_some() && value.get("e").is_none() {
            debug!(response = %value, "Binance subscription acknowledged");
            return Ok(None);
        }
        // Combined-stream endpoints wrap the event in {"stream", "data"}.
        let data = value.get_mut("data").map(serde_json::Value::take);
        if let Some(data) = data {
            value = data;
        }
        if value.get("e").and_then(|e| e.as_str()) != Some("24hrTicker") {
            return Ok(None);
        }

        let ticker: BinanceTicker = serde_json::from_value(value)
            .map_err(|e| TickerError::MalformedMessage(e.to_string()))?;
        let current_price = wire_value(&ticker.last_price).ok_or_else(|| {
            TickerError::MalformedMessage(format!("{}: missing last price", ticker.symbol))
        })?;

        Ok(Some(TickerUpdate {
            symbol: self.canonical(&ticker.symbol),
            current_price,
            change_rate_pct: wire_value(&ticker.price_change_percent),
            change_amount: wire_value(&ticker.price_change),
            open_price: wire_value(&ticker.open_price),
            high_price: wire_value(&ticker.high_price),
            low_price: wire_value(&ticker.low_price),
            prev_close_price: wire_value(&ticker.prev_close_price),
            volume_power: None,
            trade_value: wire_value(&ticker.quote_volume),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protocol() -> Binance {
        Binance::new(DEFAULT_WEBSOCKET_URL.to_string(), "usdt".to_string())
    }

    fn coin(symbol: &str, unit: &str, avg: f64) -> CoinConfig {
        CoinConfig {
            symbol: symbol.to_string(),
            icon: String::new(),
            unit_currency: unit.to_string(),
            average_purchase_price: avg,
        }
    }

    #[test]
    fn markets_use_configured_quote() {
        let market = protocol().market(&coin("btc", "KRW", 90_000_000.0));
        assert_eq!(market.wire, "BTCUSDT");
        assert_eq!(market.canonical, "BTC_USDT");
        assert_eq!(market.cost_basis, None);

        let market = protocol().market(&coin("ETH", "USDT", 2500.0));
        assert_eq!(market.cost_basis, Some(2500.0));
    }

    #[test]
    fn subscription_lists_ticker_streams() {
        let markets = vec![protocol().market(&coin("BTC", "KRW", 0.0))];
        let json = protocol().subscription(&markets).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["method"], "SUBSCRIBE");
        assert_eq!(value["params"][0], "btcusdt@ticker");
        assert_eq!(value["id"], 1);
    }

    #[test]
    fn parses_ticker_event() {
        let frame = r#"{
            "e": "24hrTicker", "E": 1672515782136, "s": "BTCUSDT",
            "p": "150.00", "P": "0.250", "w": "60000.0",
            "x": "59950.00", "c": "60100.00", "Q": "0.01",
            "o": "59950.00", "h": "60500.00", "l": "59000.00",
            "v": "1000", "q": "60000000.00", "n": 18151
        }"#;
        let update = protocol().parse_frame(frame).unwrap().unwrap();

        assert_eq!(update.symbol, "BTC_USDT");
        assert_eq!(update.current_price, 60100.0);
        assert_eq!(update.change_rate_pct, Some(0.25));
        assert_eq!(update.prev_close_price, Some(59950.0));
        assert_eq!(update.trade_value, Some(60_000_000.0));
        assert_eq!(update.volume_power, None);
    }

    #[test]
    fn unwraps_combined_stream_events() {
        let frame = r#"{"stream":"ethusdt@ticker","data":{"e":"24hrTicker","s":"ETHUSDT","c":"2500.5"}}"#;
        let update = protocol().parse_frame(frame).unwrap().unwrap();
        assert_eq!(update.symbol, "ETH_USDT");
        assert_eq!(update.change_rate_pct, None);
    }

    #[test]
    fn acknowledgements_are_ignored() {
        assert!(protocol().parse_frame(r#"{"result":null,"id":1}"#).unwrap().is_none());
        assert!(protocol().parse_frame(r#"{"e":"trade","s":"BTCUSDT"}"#).unwrap().is_none());
    }

    #[test]
    fn unknown_quote_keeps_raw_symbol() {
        assert_eq!(protocol().canonical("BTCFDUSD"), "BTCFDUSD");
        assert_eq!(protocol().canonical("USDT"), "USDT");
    }
}

//! Binance spot WebSocket wire models.

use serde::{Deserialize, Serialize};

use super::WireNumber;

/// Live subscription request (`SUBSCRIBE` method).
#[derive(Serialize)]
pub struct BinanceSubscribeRequest {
    pub method: String,
    pub params: Vec<String>,
    pub id: u64,
}

impl BinanceSubscribeRequest {
    /// Subscribes to the rolling 24h ticker stream of each pair.
    pub fn ticker(pairs: &[String], id: u64) -> Self {
        Self {
            method: "SUBSCRIBE".to_string(),
            params: pairs
                .iter()
                .map(|p| format!("{}@ticker", p.to_lowercase()))
                .collect(),
            id,
        }
    }
}

/// Rolling 24h ticker event (`"e": "24hrTicker"`).
#[derive(Debug, Deserialize)]
pub struct BinanceTicker {
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "c")]
    pub last_price: Option<WireNumber>,
    #[serde(rename = "p")]
    pub price_change: Option<WireNumber>,
    #[serde(rename = "P")]
    pub price_change_percent: Option<WireNumber>,
    #[serde(rename = "o")]
    pub open_price: Option<WireNumber>,
    #[serde(rename = "h")]
    pub high_price: Option<WireNumber>,
    #[serde(rename = "l")]
    pub low_price: Option<WireNumber>,
    /// Last price before the 24h window opened.
    #[serde(rename = "x")]
    pub prev_close_price: Option<WireNumber>,
    /// Quote asset volume over the window.
    #[serde(rename = "q")]
    pub quote_volume: Option<WireNumber>,
}

//! Bithumb public WebSocket wire models.

use serde::{Deserialize, Serialize};

use super::WireNumber;

/// Midnight-referenced accumulation window.
pub const TICK_TYPE: &str = "MID";

/// Ticker subscription request.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BithumbSubscribeRequest {
    #[serde(rename = "type")]
    pub tpe: String,
    pub symbols: Vec<String>,
    pub tick_types: Vec<String>,
}

impl BithumbSubscribeRequest {
    /// Subscribes to midnight-referenced (`MID`) ticker updates.
    pub fn ticker(symbols: Vec<String>) -> Self {
        Self {
            tpe: "ticker".to_string(),
            symbols,
            tick_types: vec![TICK_TYPE.to_string()],
        }
    }
}

/// Any frame sent by the Bithumb socket.
///
/// Ticker frames carry `type` and `content`; connection status frames
/// carry `status` and `resmsg` instead.
#[derive(Deserialize)]
pub struct BithumbFrame {
    #[serde(rename = "type")]
    pub tpe: Option<String>,
    pub content: Option<serde_json::Value>,
    pub status: Option<String>,
    pub resmsg: Option<String>,
}

/// Ticker payload. Numbers arrive string-encoded.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BithumbTicker {
    pub symbol: String,
    /// Accumulation window; only `MID` (since midnight) is applied.
    pub tick_type: Option<String>,
    pub close_price: Option<WireNumber>,
    pub open_price: Option<WireNumber>,
    pub high_price: Option<WireNumber>,
    pub low_price: Option<WireNumber>,
    pub prev_close_price: Option<WireNumber>,
    pub chg_rate: Option<WireNumber>,
    pub chg_amt: Option<WireNumber>,
    pub volume_power: Option<WireNumber>,
    pub value: Option<WireNumber>,
}

//! Upbit WebSocket wire models.

use serde::{Deserialize, Serialize};

use super::WireNumber;

/// One element of the Upbit request array.
///
/// A subscription is `[ticket, type]`, serialized as a JSON array.
#[derive(Serialize)]
#[serde(untagged)]
pub enum UpbitRequestField {
    Ticket { ticket: String },
    Type {
        #[serde(rename = "type")]
        tpe: String,
        codes: Vec<String>,
    },
}

/// Builds the ticker subscription array for the given market codes.
pub fn ticker_request(ticket: String, codes: Vec<String>) -> Vec<UpbitRequestField> {
    vec![
        UpbitRequestField::Ticket { ticket },
        UpbitRequestField::Type {
            tpe: "ticker".to_string(),
            codes,
        },
    ]
}

/// Ticker payload.
///
/// `signed_change_rate` is a fraction (0.025 = 2.5%) relative to the
/// previous day's close.
#[derive(Debug, Deserialize)]
pub struct UpbitTicker {
    /// `QUOTE-BASE` market code, e.g. `KRW-BTC`.
    pub code: String,
    pub trade_price: Option<WireNumber>,
    pub opening_price: Option<WireNumber>,
    pub high_price: Option<WireNumber>,
    pub low_price: Option<WireNumber>,
    pub prev_closing_price: Option<WireNumber>,
    pub signed_change_price: Option<WireNumber>,
    pub signed_change_rate: Option<WireNumber>,
    pub acc_trade_price_24h: Option<WireNumber>,
}

/// Error frame returned for rejected requests.
#[derive(Debug, Deserialize)]
pub struct UpbitErrorFrame {
    pub error: UpbitError,
}

#[derive(Debug, Deserialize)]
pub struct UpbitError {
    pub name: Option<String>,
    pub message: Option<String>,
}

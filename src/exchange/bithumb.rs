//! Bithumb public ticker stream.

use tracing::debug;

use super::{ExchangeProtocol, Market, parse_market_listing};
use crate::config::CoinConfig;
use crate::models::bithumb::{BithumbFrame, BithumbSubscribeRequest, BithumbTicker, TICK_TYPE};
use crate::models::{ExchangeKind, MarketNames, TickerUpdate, wire_value};
use crate::{Result, TickerError};

/// Default public WebSocket endpoint.
pub const DEFAULT_WEBSOCKET_URL: &str = "wss://pubwss.bithumb.com/pub/ws";

const MARKETS_URL: &str = "https://api.bithumb.com/v1/market/all?isDetails=false";

/// Bithumb wire protocol.
pub struct Bithumb {
    websocket_url: String,
}

impl Bithumb {
    pub fn new(websocket_url: String) -> Self {
        Self { websocket_url }
    }
}

impl ExchangeProtocol for Bithumb {
    fn kind(&self) -> ExchangeKind {
        ExchangeKind::Bithumb
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
        let canonical = coin.market();
        Market::new(coin, canonical.clone(), canonical)
    }

    fn subscription(&self, markets: &[Market]) -> Result<String> {
        let request =
            BithumbSubscribeRequest::ticker(markets.iter().map(|m| m.wire.clone()).collect());
        Ok(serde_json::to_string(&request)?)
    }

    fn parse_frame(&self, text: &str) -> Result<Option<TickerUpdate>> {
        let frame: BithumbFrame = serde_json::from_str(text)
            .map_err(|e| TickerError::MalformedMessage(e.to_string()))?;

        if let Some(status) = frame.status {
            debug!(status, resmsg = ?frame.resmsg, "Bithumb status");
            return Ok(None);
        }
        if frame.tpe.as_deref() != Some("ticker") {
            return Ok(None);
        }

        let content = frame
            .content
            .ok_or_else(|| TickerError::MalformedMessage("ticker without content".to_string()))?;
        let ticker: BithumbTicker = serde_json::from_value(content)
            .map_err(|e| TickerError::MalformedMessage(e.to_string()))?;

        if let Some(tick_type) = ticker.tick_type.as_deref()
            && tick_type != TICK_TYPE
        {
            debug!(symbol = %ticker.symbol, tick_type, "Skipping non-MID tick");
            return Ok(None);
        }

        let current_price = wire_value(&ticker.close_price).ok_or_else(|| {
            TickerError::MalformedMessage(format!("{}: missing closePrice", ticker.symbol))
        })?;

        Ok(Some(TickerUpdate {
            symbol: ticker.symbol.to_uppercase(),
            current_price,
            change_rate_pct: wire_value(&ticker.chg_rate),
            change_amount: wire_value(&ticker.chg_amt),
            open_price: wire_value(&ticker.open_price),
            high_price: wire_value(&ticker.high_price),
            low_price: wire_value(&ticker.low_price),
            prev_close_price: wire_value(&ticker.prev_close_price),
            volume_power: wire_value(&ticker.volume_power),
            trade_value: wire_value(&ticker.value),
        }))
    }
}

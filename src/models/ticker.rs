//! Standardized ticker records.

use super::ExchangeKind;

/// One exchange ticker translated into exchange-agnostic fields, before
/// presentation hints and tick-over-tick state are attached.
///
/// Only `symbol` and `current_price` are required; every other field is
/// `None` when the exchange omitted it or reported a non-finite value.
#[derive(Clone, Debug, PartialEq)]
pub struct TickerUpdate {
    /// Canonical `BASE_QUOTE` symbol.
    pub symbol: String,
    pub current_price: f64,
    /// 24h reference change in percent.
    pub change_rate_pct: Option<f64>,
    /// 24h reference change in quote currency.
    pub change_amount: Option<f64>,
    pub open_price: Option<f64>,
    pub high_price: Option<f64>,
    pub low_price: Option<f64>,
    pub prev_close_price: Option<f64>,
    /// Buy/sell pressure, only some exchanges report it.
    pub volume_power: Option<f64>,
    /// Traded value over the reference window, in quote currency.
    pub trade_value: Option<f64>,
}

impl TickerUpdate {
    /// Creates an update with only the required fields set.
    pub fn new(symbol: impl Into<String>, current_price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            current_price,
            change_rate_pct: None,
            change_amount: None,
            open_price: None,
            high_price: None,
            low_price: None,
            prev_close_price: None,
            volume_power: None,
            trade_value: None,
        }
    }
}

/// Presentation hints and cost basis resolved for one symbol.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordLabels {
    pub display_name: String,
    pub icon: String,
    pub cost_basis: Option<f64>,
}

/// Snapshot of one trading pair on one exchange.
///
/// Records are replaced wholesale on every update, never merged.
#[derive(Clone, Debug, PartialEq)]
pub struct TickerRecord {
    pub exchange: ExchangeKind,
    pub symbol: String,
    pub display_name: String,
    pub icon: String,
    pub current_price: f64,
    /// Previous record's price, or the exchange's previous close on the
    /// first sighting.
    pub prev_comparison_price: Option<f64>,
    pub change_rate_pct: Option<f64>,
    pub change_amount: Option<f64>,
    pub open_price: Option<f64>,
    pub high_price: Option<f64>,
    pub low_price: Option<f64>,
    pub prev_close_price: Option<f64>,
    pub volume_power: Option<f64>,
    pub trade_value: Option<f64>,
    pub average_purchase_price: Option<f64>,
    pub profit_loss_rate_pct: Option<f64>,
}

/// Tick-over-tick price movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Flat,
    /// No comparison price is available.
    Unknown,
}

impl TickerRecord {
    /// Builds a record from a parsed update.
    ///
    /// `previous` is the record this one replaces, if any. Its
    /// `current_price` becomes the comparison price; without it the
    /// exchange-reported previous close is used.
    pub fn standardize(
        exchange: ExchangeKind,
        update: TickerUpdate,
        previous: Option<&TickerRecord>,
        labels: RecordLabels,
    ) -> Self {
        let prev_comparison_price = previous
            .map(|p| p.current_price)
            .or(update.prev_close_price);
        let profit_loss_rate_pct = labels
            .cost_basis
            .and_then(|basis| profit_loss_rate(update.current_price, basis));

        Self {
            exchange,
            symbol: update.symbol,
            display_name: labels.display_name,
            icon: labels.icon,
            current_price: update.current_price,
            prev_comparison_price,
            change_rate_pct: update.change_rate_pct,
            change_amount: update.change_amount,
            open_price: update.open_price,
            high_price: update.high_price,
            low_price: update.low_price,
            prev_close_price: update.prev_close_price,
            volume_power: update.volume_power,
            trade_value: update.trade_value,
            average_purchase_price: labels.cost_basis,
            profit_loss_rate_pct,
        }
    }

    /// Direction of the current price relative to the comparison price.
    pub fn direction(&self) -> Direction {
        match self.prev_comparison_price {
            None => Direction::Unknown,
            Some(prev) if self.current_price > prev => Direction::Up,
            Some(prev) if self.current_price < prev => Direction::Down,
            Some(_) => Direction::Flat,
        }
    }

    /// 24h high relative to the previous close, in percent.
    pub fn high_change_pct(&self) -> Option<f64> {
        relative_to_close(self.high_price, self.prev_close_price)
    }

    /// 24h low relative to the previous close, in percent.
    pub fn low_change_pct(&self) -> Option<f64> {
        relative_to_close(self.low_price, self.prev_close_price)
    }
}

/// `(current - basis) / basis * 100`, or `None` for a non-positive basis.
pub fn profit_loss_rate(current: f64, basis: f64) -> Option<f64> {
    if !(basis.is_finite() && basis > 0.0 && current.is_finite()) {
        return None;
    }
    Some((current - basis) / basis * 100.0)
}

fn relative_to_close(price: Option<f64>, close: Option<f64>) -> Option<f64> {
    match (price, close) {
        (Some(price), Some(close)) if close > 0.0 => Some((price - close) / close * 100.0),
        _ => None,
    }
}

//! Whole-market sentiment derived from a record snapshot.

use super::TickerRecord;

/// Weighted change above which the market counts as strongly moving.
const STRONG_MOVE_PCT: f64 = 0.5;

/// Coarse market mood.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SentimentLevel {
    StrongRise,
    Rise,
    Flat,
    Fall,
    StrongFall,
}

impl SentimentLevel {
    fn from_change(change: f64) -> Self {
        if change > STRONG_MOVE_PCT {
            Self::StrongRise
        } else if change > 0.0 {
            Self::Rise
        } else if change < -STRONG_MOVE_PCT {
            Self::StrongFall
        } else if change < 0.0 {
            Self::Fall
        } else {
            Self::Flat
        }
    }

    /// Returns a display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::StrongRise => "Strong rise",
            Self::Rise => "Rise",
            Self::Flat => "Flat",
            Self::Fall => "Fall",
            Self::StrongFall => "Strong fall",
        }
    }
}

/// Trade-value-weighted market summary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarketSentiment {
    /// Change rate weighted by traded value, in percent.
    pub weighted_change_pct: f64,
    pub level: SentimentLevel,
    /// Mean volume power over records that report one.
    pub average_volume_power: Option<f64>,
}

impl MarketSentiment {
    /// Summarizes the given records, or `None` when no record reports both
    /// a change rate and a positive traded value.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a TickerRecord>) -> Option<Self> {
        let mut weighted = 0.0;
        let mut total_value = 0.0;
        let mut power_sum = 0.0;
        let mut power_count = 0usize;

        for record in records {
            if let (Some(rate), Some(value)) = (record.change_rate_pct, record.trade_value)
                && value > 0.0
            {
                weighted += rate * value;
                total_value += value;
            }
            if let Some(power) = record.volume_power {
                power_sum += power;
                power_count += 1;
            }
        }

        if total_value <= 0.0 {
            return None;
        }

        let weighted_change_pct = weighted / total_value;
        Some(Self {
            weighted_change_pct,
            level: SentimentLevel::from_change(weighted_change_pct),
            average_volume_power: (power_count > 0).then(|| power_sum / power_count as f64),
        })
    }
}

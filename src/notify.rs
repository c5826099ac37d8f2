//! Change-rate threshold notifications.
//!
//! A notification fires when a symbol's 24h change rate reaches a new
//! multiple of [`THRESHOLD_STEP_PCT`] in its current direction. Each
//! direction keeps its own high-water mark, and crossing zero resets the
//! opposite one so a fall after a rally is announced from the first step.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::info;

/// Size of one threshold step, in percent.
pub const THRESHOLD_STEP_PCT: f64 = 5.0;

/// A message for the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

/// Delivers notifications somewhere outside the table.
pub trait NotificationSink: Send {
    fn notify(&self, notification: &Notification);
}

/// Writes notifications to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: &Notification) {
        info!(title = %notification.title, "{}", notification.message);
    }
}

/// Highest announced multiples per direction; zero means none.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Marks {
    up: i64,
    down: i64,
}

/// Remembers which thresholds were already announced, per symbol.
#[derive(Debug, Default)]
pub struct ThresholdTracker {
    marks: HashMap<String, Marks>,
}

impl ThresholdTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one change rate. Unknown rates are ignored.
    ///
    /// The first rate seen for a symbol only seeds its marks, so starting
    /// up on a day that is already +12% stays quiet until +15%.
    pub fn observe(&mut self, symbol: &str, name: &str, rate: Option<f64>) -> Option<Notification> {
        let rate = rate.filter(|r| r.is_finite())?;
        let multiple = (rate / THRESHOLD_STEP_PCT).trunc() as i64;

        let marks = match self.marks.entry(symbol.to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(Marks {
                    up: multiple.max(0),
                    down: multiple.min(0),
                });
                return None;
            }
            Entry::Occupied(entry) => entry.into_mut(),
        };

        if rate > 0.0 {
            marks.down = 0;
            if multiple > marks.up {
                marks.up = multiple;
                return Some(notification(symbol, name, "up", multiple, rate));
            }
        } else if rate < 0.0 {
            marks.up = 0;
            if multiple < marks.down {
                marks.down = multiple;
                return Some(notification(symbol, name, "down", multiple, rate));
            }
        }
        None
    }

    /// Forgets every symbol, e.g. after switching exchange.
    pub fn clear(&mut self) {
        self.marks.clear();
    }
}

fn notification(symbol: &str, name: &str, direction: &str, multiple: i64, rate: f64) -> Notification {
    let threshold = multiple as f64 * THRESHOLD_STEP_PCT;
    let title = if name.is_empty() || name == symbol {
        symbol.to_string()
    } else {
        format!("{name} ({symbol})")
    };
    Notification {
        title,
        message: format!("{direction} through {threshold:+.0}% (now {rate:+.2}%)"),
    }
}

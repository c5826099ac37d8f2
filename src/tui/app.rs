//! Application state for the TUI.
//!
//! `App` is owned by the main loop and is the only place state lives:
//! the adapters (through the aggregator), the redraw scheduler, the
//! notification tracker and the user's display choices.

use tracing::{error, info};

use crate::aggregator::{Aggregator, Snapshot};
use crate::cli::SortBy;
use crate::models::ExchangeKind;
use crate::notify::{Notification, NotificationSink, ThresholdTracker, TracingSink};
use crate::scheduler::RenderScheduler;

/// Rows reserved for bars, header and borders when no limit is given.
const RESERVED_ROWS: u16 = 10;

/// How the table is laid out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DisplayOptions {
    pub sort_by: SortBy,
    /// Explicit row limit; `None` fits the terminal.
    pub limit: Option<usize>,
}

impl DisplayOptions {
    /// Row limit for a terminal of the given height.
    pub fn effective_limit(&self, terminal_height: u16) -> usize {
        self.limit
            .unwrap_or_else(|| usize::from(terminal_height.saturating_sub(RESERVED_ROWS).max(1)))
    }
}

/// Central application state container.
pub struct App {
    pub aggregator: Aggregator,
    pub scheduler: RenderScheduler,
    pub options: DisplayOptions,
    /// Whether credentials were configured.
    pub authenticated: bool,
    /// Last known terminal height; sizes the table when no limit is given.
    pub terminal_height: u16,
    /// Most recent threshold notification, shown in the status bar.
    pub last_notification: Option<Notification>,
    pub should_quit: bool,
    tracker: ThresholdTracker,
    sink: Box<dyn NotificationSink>,
}

impl App {
    pub fn new(aggregator: Aggregator, scheduler: RenderScheduler, options: DisplayOptions) -> Self {
        let authenticated = aggregator.config().is_authenticated();
        Self {
            aggregator,
            scheduler,
            options,
            authenticated,
            terminal_height: 24,
            last_notification: None,
            should_quit: false,
            tracker: ThresholdTracker::new(),
            sink: Box::new(TracingSink),
        }
    }

    /// Replaces where threshold notifications are delivered.
    pub fn with_sink(mut self, sink: Box<dyn NotificationSink>) -> Self {
        self.sink = sink;
        self
    }

    /// What the renderer draws.
    pub fn snapshot(&self) -> Snapshot {
        self.aggregator.snapshot()
    }

    /// Switches the active exchange and schedules a redraw.
    pub fn switch_exchange(&mut self, kind: ExchangeKind) {
        match self.aggregator.switch_to(kind) {
            Ok(true) => {
                self.tracker.clear();
                self.last_notification = None;
                self.scheduler.signal();
            }
            Ok(false) => {}
            Err(e) => error!(exchange = %kind, "Failed to switch exchange: {e}"),
        }
    }

    pub fn toggle_sort(&mut self) {
        self.options.sort_by = self.options.sort_by.toggled();
        info!(sort_by = self.options.sort_by.label(), "Sort order changed");
        self.scheduler.signal();
    }

    /// Checks the freshly updated record for a threshold crossing.
    pub fn check_threshold(&mut self, symbol: &str) {
        let snapshot = self.aggregator.snapshot();
        let Some(record) = snapshot.records.get(symbol) else {
            return;
        };
        if let Some(notification) =
            self.tracker
                .observe(&record.symbol, &record.display_name, record.change_rate_pct)
        {
            self.sink.notify(&notification);
            self.last_notification = Some(notification);
        }
    }
}

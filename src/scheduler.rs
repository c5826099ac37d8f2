//! Debounced redraw scheduling.
//!
//! Ticker frames arrive far faster than a terminal can usefully redraw.
//! Every "new data" signal (including resizes) goes through
//! [`RenderScheduler::signal`]; the first one arms a timer and the rest are
//! absorbed until the timer delivers [`Message::RedrawDue`].

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::tui::Message;

/// Quiescence window between the first signal and the redraw.
pub const QUIESCENCE_WINDOW: Duration = Duration::from_millis(100);

/// Coalesces redraw requests into at most one pending timer.
pub struct RenderScheduler {
    window: Duration,
    pending: Option<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<Message>,
}

impl RenderScheduler {
    pub fn new(tx: mpsc::UnboundedSender<Message>) -> Self {
        Self::with_window(tx, QUIESCENCE_WINDOW)
    }

    pub fn with_window(tx: mpsc::UnboundedSender<Message>, window: Duration) -> Self {
        Self {
            window,
            pending: None,
            tx,
        }
    }

    /// Requests a redraw. Returns `true` if this call armed the timer,
    /// `false` if one was already pending.
    pub fn signal(&mut self) -> bool {
        if self.pending.is_some() {
            return false;
        }

        let tx = self.tx.clone();
        let window = self.window;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let _ = tx.send(Message::RedrawDue);
        }));
        true
    }

    /// Consumes a delivered timer. Returns whether a redraw was pending;
    /// a `RedrawDue` that arrives with nothing pending should not redraw.
    pub fn fire(&mut self) -> bool {
        match self.pending.take() {
            Some(timer) => {
                timer.abort();
                true
            }
            None => false,
        }
    }

    /// Drops any pending redraw.
    pub fn cancel(&mut self) {
        if let Some(timer) = self.pending.take() {
            timer.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl Drop for RenderScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

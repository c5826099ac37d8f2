//! Connection supervision and standardization for one exchange.
//!
//! The adapter lives on the main loop and is the only writer of its record
//! map. Network I/O happens in a session task that reports back through
//! [`Message::Session`]; reconnects are timers that report back through
//! [`Message::ReconnectDue`]. Both carry the generation they were started
//! for, and anything from an older generation is ignored.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{ExchangeProtocol, Market};
use crate::Result;
use crate::config::AppConfig;
use crate::models::{ExchangeKind, MarketNames, RecordLabels, TickerRecord};
use crate::tui::Message;
use crate::websocket::{SessionEvent, SessionParams, spawn_session};

/// Fixed delay between a dropped connection and the next attempt.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Records keyed by canonical symbol.
pub type RecordMap = HashMap<String, TickerRecord>;

/// Starts the I/O side of a session.
pub type SessionLauncher = Box<dyn Fn(SessionParams) + Send + Sync>;

/// Where an adapter is in its connection lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not wanted, nothing in flight.
    #[default]
    Idle,
    /// A session is fetching metadata or opening the socket.
    Connecting,
    /// Subscribed and receiving frames.
    Open,
    /// The last session closed; a reconnect timer is pending.
    Backoff,
}

impl ConnectionState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Disconnected",
            Self::Connecting => "Connecting",
            Self::Open => "Connected",
            Self::Backoff => "Reconnecting",
        }
    }
}

/// Effect of one session event on the adapter.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// Nothing visible changed.
    Ignored,
    /// The connection state changed.
    StatusChanged,
    /// The record for this symbol was replaced.
    Updated(String),
}

/// Owns one exchange's connection and its latest records.
pub struct Adapter {
    protocol: Arc<dyn ExchangeProtocol>,
    tx: mpsc::UnboundedSender<Message>,
    launcher: SessionLauncher,
    reconnect_delay: Duration,
    state: ConnectionState,
    /// False once disconnect was requested; gates reconnects.
    wanted: bool,
    generation: u64,
    session: Option<oneshot::Sender<()>>,
    reconnect_timer: Option<JoinHandle<()>>,
    markets: Vec<Market>,
    market_names: MarketNames,
    records: Arc<RecordMap>,
}

impl Adapter {
    /// Creates an idle adapter that spawns real WebSocket sessions.
    pub fn new(protocol: Arc<dyn ExchangeProtocol>, tx: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            protocol,
            tx,
            launcher: Box::new(|params| {
                spawn_session(params);
            }),
            reconnect_delay: RECONNECT_DELAY,
            state: ConnectionState::Idle,
            wanted: false,
            generation: 0,
            session: None,
            reconnect_timer: None,
            markets: Vec::new(),
            market_names: MarketNames::new(),
            records: Arc::new(RecordMap::new()),
        }
    }

    /// Replaces how sessions are started.
    pub fn with_launcher(mut self, launcher: SessionLauncher) -> Self {
        self.launcher = launcher;
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn kind(&self) -> ExchangeKind {
        self.protocol.kind()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_wanted(&self) -> bool {
        self.wanted
    }

    /// Point-in-time view of the records. Never blocks.
    pub fn snapshot(&self) -> Arc<RecordMap> {
        Arc::clone(&self.records)
    }

    /// Starts a connection for the configured coins.
    ///
    /// A no-op while a session is already connecting or open. During
    /// backoff the pending timer is cancelled and a session starts
    /// immediately. Returns whether a session was started.
    ///
    /// # Errors
    ///
    /// Returns a [`TickerError`](crate::TickerError) if the subscription
    /// message cannot be built.
    pub fn connect(&mut self, config: &AppConfig) -> Result<bool> {
        if self.wanted && matches!(self.state, ConnectionState::Connecting | ConnectionState::Open)
        {
            debug!(exchange = %self.kind(), state = ?self.state, "Connect ignored, session in flight");
            return Ok(false);
        }

        self.cancel_reconnect();
        self.markets = dedup_markets(
            config
                .coins
                .iter()
                .map(|coin| self.protocol.market(coin)),
        );
        self.wanted = true;
        self.start_session()?;
        Ok(true)
    }

    /// Stops the connection and clears the records.
    ///
    /// Any session event or reconnect timer already in flight becomes a
    /// no-op because the generation moves on.
    pub fn disconnect(&mut self) {
        self.wanted = false;
        self.generation += 1;
        self.stop_session();
        self.cancel_reconnect();
        self.records = Arc::new(RecordMap::new());
        if self.state != ConnectionState::Idle {
            info!(exchange = %self.kind(), "Disconnected");
        }
        self.state = ConnectionState::Idle;
    }

    /// Applies one event from the session of the given generation.
    pub fn handle(&mut self, generation: u64, event: SessionEvent) -> Outcome {
        if !self.wanted || generation != self.generation {
            debug!(
                exchange = %self.kind(),
                generation,
                current = self.generation,
                "Ignoring event from stale session"
            );
            return Outcome::Ignored;
        }

        match event {
            SessionEvent::Markets(names) => {
                self.market_names = names;
                self.relabel();
                Outcome::Ignored
            }
            SessionEvent::Opened => {
                info!(exchange = %self.kind(), generation, "Stream open");
                self.state = ConnectionState::Open;
                Outcome::StatusChanged
            }
            SessionEvent::Frame(text) => self.apply_frame(&text),
            SessionEvent::Error(error) => {
                warn!(exchange = %self.kind(), generation, "Socket error: {error}");
                Outcome::Ignored
            }
            SessionEvent::Closed => {
                self.session = None;
                warn!(
                    exchange = %self.kind(),
                    generation,
                    delay = ?self.reconnect_delay,
                    "Connection closed, scheduling reconnect"
                );
                self.schedule_reconnect();
                Outcome::StatusChanged
            }
        }
    }

    /// Fires a reconnect timer. Returns whether a session was started.
    ///
    /// # Errors
    ///
    /// Returns a [`TickerError`](crate::TickerError) if the subscription
    /// message cannot be built.
    pub fn handle_reconnect_due(&mut self, generation: u64) -> Result<bool> {
        if !self.wanted || generation != self.generation || self.state != ConnectionState::Backoff
        {
            debug!(exchange = %self.kind(), generation, "Ignoring stale reconnect timer");
            return Ok(false);
        }

        self.reconnect_timer = None;
        info!(exchange = %self.kind(), "Reconnecting");
        self.start_session()?;
        Ok(true)
    }

    fn start_session(&mut self) -> Result<()> {
        let subscription = self.protocol.subscription(&self.markets)?;

        self.stop_session();
        self.generation += 1;
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        (self.launcher)(SessionParams {
            protocol: Arc::clone(&self.protocol),
            subscription,
            fetch_markets: self.market_names.is_empty(),
            generation: self.generation,
            tx: self.tx.clone(),
            shutdown: shutdown_rx,
        });
        self.session = Some(shutdown_tx);
        self.state = ConnectionState::Connecting;
        Ok(())
    }

    fn stop_session(&mut self) {
        if let Some(shutdown) = self.session.take() {
            // The session may already have ended on its own.
            let _ = shutdown.send(());
        }
    }

    fn schedule_reconnect(&mut self) {
        self.cancel_reconnect();
        self.state = ConnectionState::Backoff;

        let tx = self.tx.clone();
        let exchange = self.kind();
        let generation = self.generation;
        let delay = self.reconnect_delay;
        self.reconnect_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Message::ReconnectDue {
                exchange,
                generation,
            });
        }));
    }

    fn cancel_reconnect(&mut self) {
        if let Some(timer) = self.reconnect_timer.take() {
            timer.abort();
        }
    }

    fn apply_frame(&mut self, text: &str) -> Outcome {
        let update = match self.protocol.parse_frame(text) {
            Ok(Some(update)) => update,
            Ok(None) => return Outcome::Ignored,
            Err(e) => {
                debug!(exchange = %self.kind(), "Dropping frame: {e}");
                return Outcome::Ignored;
            }
        };

        let symbol = update.symbol.clone();
        let labels = self.labels(&symbol);
        let exchange = self.kind();
        let records = Arc::make_mut(&mut self.records);
        let record = TickerRecord::standardize(exchange, update, records.get(&symbol), labels);
        records.insert(symbol.clone(), record);
        Outcome::Updated(symbol)
    }

    fn labels(&self, symbol: &str) -> RecordLabels {
        let market = self.markets.iter().find(|m| m.canonical == symbol);
        RecordLabels {
            display_name: self
                .market_names
                .get(symbol)
                .cloned()
                .unwrap_or_else(|| symbol.to_string()),
            icon: market.map(|m| m.icon.clone()).unwrap_or_default(),
            cost_basis: market.and_then(|m| m.cost_basis),
        }
    }

    /// Applies freshly fetched names to records that already exist.
    fn relabel(&mut self) {
        if self.records.is_empty() {
            return;
        }
        let names = &self.market_names;
        for (symbol, record) in Arc::make_mut(&mut self.records).iter_mut() {
            if let Some(name) = names.get(symbol) {
                record.display_name = name.clone();
            }
        }
    }
}

/// Collapses coins that resolve to the same market, keeping first-seen
/// order. An entry that carries a cost basis replaces one that does not.
fn dedup_markets(markets: impl Iterator<Item = Market>) -> Vec<Market> {
    let mut unique: Vec<Market> = Vec::new();
    for market in markets {
        match unique.iter_mut().find(|m| m.canonical == market.canonical) {
            Some(existing) => {
                if existing.cost_basis.is_none() && market.cost_basis.is_some() {
                    let icon = std::mem::take(&mut existing.icon);
                    *existing = market;
                    if existing.icon.is_empty() {
                        existing.icon = icon;
                    }
                }
            }
            None => unique.push(market),
        }
    }
    unique
}

impl Drop for Adapter {
    fn drop(&mut self) {
        self.stop_session();
        self.cancel_reconnect();
    }
}

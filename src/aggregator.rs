//! Registry of exchange adapters with exactly one active.
//!
//! Only the active adapter is connected, and only its records are ever
//! exposed. Switching disconnects (and clears) the previous adapter before
//! the next one connects, so a snapshot never mixes two exchanges.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::exchange::adapter::RecordMap;
use crate::exchange::{Adapter, ConnectionState, Outcome, protocol_for};
use crate::models::ExchangeKind;
use crate::tui::Message;
use crate::websocket::SessionEvent;
use crate::{Result, TickerError};

/// What the renderer sees.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub exchange: ExchangeKind,
    pub state: ConnectionState,
    pub records: Arc<RecordMap>,
}

/// Owns every adapter; forwards events to the active one.
pub struct Aggregator {
    config: Arc<AppConfig>,
    adapters: Vec<Adapter>,
    active: ExchangeKind,
}

impl Aggregator {
    /// Creates one idle adapter per supported exchange.
    ///
    /// Nothing connects until [`switch_to`](Self::switch_to) is called.
    pub fn new(
        config: Arc<AppConfig>,
        active: ExchangeKind,
        tx: &mpsc::UnboundedSender<Message>,
    ) -> Self {
        let adapters = ExchangeKind::ALL
            .into_iter()
            .map(|kind| Adapter::new(protocol_for(kind, &config), tx.clone()))
            .collect();
        Self::with_adapters(config, active, adapters)
    }

    /// Builds a registry over pre-constructed adapters.
    pub fn with_adapters(config: Arc<AppConfig>, active: ExchangeKind, adapters: Vec<Adapter>) -> Self {
        Self {
            config,
            adapters,
            active,
        }
    }

    pub fn active(&self) -> ExchangeKind {
        self.active
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Makes `kind` the active exchange and connects it.
    ///
    /// Returns `false` when `kind` is already active and wanted.
    ///
    /// # Errors
    ///
    /// Returns [`TickerError::Config`] if no adapter exists for `kind`, or
    /// the adapter's connect error.
    pub fn switch_to(&mut self, kind: ExchangeKind) -> Result<bool> {
        if kind == self.active && self.adapter(kind).is_some_and(Adapter::is_wanted) {
            debug!(exchange = %kind, "Already active");
            return Ok(false);
        }
        if !self.adapters.iter().any(|a| a.kind() == kind) {
            return Err(TickerError::Config(format!("no adapter for {kind}")));
        }

        for adapter in self.adapters.iter_mut().filter(|a| a.kind() != kind) {
            adapter.disconnect();
        }
        info!(from = %self.active, to = %kind, "Switching exchange");
        self.active = kind;

        let config = Arc::clone(&self.config);
        match self.adapter_mut(kind) {
            Some(adapter) => adapter.connect(&config),
            None => Err(TickerError::Config(format!("no adapter for {kind}"))),
        }
    }

    /// Routes a session event to its adapter if that adapter is active.
    pub fn handle(&mut self, exchange: ExchangeKind, generation: u64, event: SessionEvent) -> Outcome {
        if exchange != self.active {
            debug!(%exchange, active = %self.active, "Ignoring event from inactive exchange");
            return Outcome::Ignored;
        }
        match self.adapter_mut(exchange) {
            Some(adapter) => adapter.handle(generation, event),
            None => Outcome::Ignored,
        }
    }

    /// Routes a reconnect timer to its adapter if that adapter is active.
    ///
    /// # Errors
    ///
    /// Returns the adapter's connect error.
    pub fn handle_reconnect_due(&mut self, exchange: ExchangeKind, generation: u64) -> Result<bool> {
        if exchange != self.active {
            return Ok(false);
        }
        match self.adapter_mut(exchange) {
            Some(adapter) => adapter.handle_reconnect_due(generation),
            None => Ok(false),
        }
    }

    /// Point-in-time view of the active exchange.
    pub fn snapshot(&self) -> Snapshot {
        match self.adapter(self.active) {
            Some(adapter) => Snapshot {
                exchange: self.active,
                state: adapter.state(),
                records: adapter.snapshot(),
            },
            None => Snapshot {
                exchange: self.active,
                state: ConnectionState::Idle,
                records: Arc::new(RecordMap::new()),
            },
        }
    }

    /// Disconnects every adapter.
    pub fn shutdown(&mut self) {
        for adapter in &mut self.adapters {
            adapter.disconnect();
        }
    }

    fn adapter(&self, kind: ExchangeKind) -> Option<&Adapter> {
        self.adapters.iter().find(|a| a.kind() == kind)
    }

    fn adapter_mut(&mut self, kind: ExchangeKind) -> Option<&mut Adapter> {
        self.adapters.iter_mut().find(|a| a.kind() == kind)
    }
}

//! One exchange connection, from metadata fetch to close.
//!
//! A session task never touches shared state. It reports what happens on
//! the wire as [`SessionEvent`]s tagged with its exchange and generation,
//! and the owning adapter decides what they mean. Reconnecting is the
//! adapter's job; a session ends for good after reporting
//! [`SessionEvent::Closed`].

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tungstenite::Message as WsMessage;

use super::{WsReader, connect, send_text};
use crate::Result;
use crate::exchange::ExchangeProtocol;
use crate::models::{ExchangeKind, MarketNames};
use crate::tui::Message;

/// Upper bound on the WebSocket handshake.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on the market-name REST request.
const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// What happened on one connection.
#[derive(Debug)]
pub enum SessionEvent {
    /// Market display names were fetched.
    Markets(MarketNames),
    /// The socket is open and the subscription was sent.
    Opened,
    /// A text (or UTF-8 binary) frame arrived.
    Frame(String),
    /// A socket-level error occurred. Always followed by [`Closed`](Self::Closed).
    Error(String),
    /// The connection is gone.
    Closed,
}

/// Everything a session task needs, handed over by the adapter.
pub struct SessionParams {
    pub protocol: Arc<dyn ExchangeProtocol>,
    /// Subscription message sent once after the socket opens.
    pub subscription: String,
    pub fetch_markets: bool,
    pub generation: u64,
    pub tx: mpsc::UnboundedSender<Message>,
    /// Resolves (or errors when the sender is dropped) when the adapter
    /// wants the session gone.
    pub shutdown: oneshot::Receiver<()>,
}

/// Why the reader loop exited.
enum DisconnectReason {
    /// The adapter asked for the session to end.
    Shutdown,
    /// The server closed the stream.
    Ended,
    /// Reading failed.
    ConnectionError(String),
}

/// Tags events with the session they belong to.
struct EventSender {
    exchange: ExchangeKind,
    generation: u64,
    tx: mpsc::UnboundedSender<Message>,
}

impl EventSender {
    /// Returns `false` once the main loop is gone.
    fn send(&self, event: SessionEvent) -> bool {
        self.tx
            .send(Message::Session {
                exchange: self.exchange,
                generation: self.generation,
                event,
            })
            .is_ok()
    }

    fn fail(&self, error: String) {
        self.send(SessionEvent::Error(error));
        self.send(SessionEvent::Closed);
    }
}

/// Spawns [`run_session`] on the current runtime.
pub fn spawn_session(params: SessionParams) -> JoinHandle<()> {
    tokio::spawn(run_session(params))
}

/// Runs one connection to completion.
///
/// Fetches market names first when asked to (failure is only logged),
/// then connects, subscribes and forwards frames until the socket closes
/// or the adapter signals shutdown.
pub async fn run_session(params: SessionParams) {
    let SessionParams {
        protocol,
        subscription,
        fetch_markets,
        generation,
        tx,
        mut shutdown,
    } = params;
    let events = EventSender {
        exchange: protocol.kind(),
        generation,
        tx,
    };

    if fetch_markets && let Some(url) = protocol.markets_url() {
        tokio::select! {
            _ = &mut shutdown => return,
            result = fetch_market_names(protocol.as_ref(), url) => match result {
                Ok(names) => {
                    info!(exchange = %events.exchange, markets = names.len(), "Fetched market names");
                    if !events.send(SessionEvent::Markets(names)) {
                        return;
                    }
                }
                Err(e) => warn!(exchange = %events.exchange, "Market name lookup failed: {e}"),
            },
        }
    }

    info!(exchange = %events.exchange, generation, url = protocol.websocket_url(), "Connecting to WebSocket");
    let connected = tokio::select! {
        _ = &mut shutdown => return,
        result = tokio::time::timeout(CONNECT_TIMEOUT, connect(protocol.websocket_url())) => result,
    };
    let (mut write, read) = match connected {
        Ok(Ok(pair)) => pair,
        Ok(Err(e)) => {
            events.fail(e.to_string());
            return;
        }
        Err(_) => {
            events.fail(format!("connect timed out after {CONNECT_TIMEOUT:?}"));
            return;
        }
    };

    if let Err(e) = send_text(&mut write, &subscription).await {
        events.fail(e.to_string());
        return;
    }
    info!(exchange = %events.exchange, generation, "Subscribed to ticker stream");
    if !events.send(SessionEvent::Opened) {
        return;
    }

    match read_loop(read, &events, &mut shutdown).await {
        DisconnectReason::Shutdown => {
            let _ = write.send(WsMessage::Close(None)).await;
            debug!(exchange = %events.exchange, generation, "Session shut down");
        }
        DisconnectReason::Ended => {
            events.send(SessionEvent::Closed);
        }
        DisconnectReason::ConnectionError(e) => events.fail(e),
    }
}

/// Forwards frames until the stream ends, errors, or shutdown is signalled.
async fn read_loop(
    mut read: WsReader,
    events: &EventSender,
    shutdown: &mut oneshot::Receiver<()>,
) -> DisconnectReason {
    loop {
        tokio::select! {
            _ = &mut *shutdown => return DisconnectReason::Shutdown,
            msg = read.next() => {
                let text = match msg {
                    Some(Ok(WsMessage::Text(text))) => text.as_str().to_owned(),
                    Some(Ok(WsMessage::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                        Ok(text) => text,
                        Err(_) => {
                            debug!(exchange = %events.exchange, "Skipping non-UTF-8 binary frame");
                            continue;
                        }
                    },
                    Some(Ok(WsMessage::Close(frame))) => {
                        info!(exchange = %events.exchange, ?frame, "Server closed connection");
                        return DisconnectReason::Ended;
                    }
                    Some(Ok(_)) => continue, // Ping/Pong/raw frames
                    Some(Err(e)) => return DisconnectReason::ConnectionError(e.to_string()),
                    None => return DisconnectReason::Ended,
                };
                if !events.send(SessionEvent::Frame(text)) {
                    return DisconnectReason::Shutdown;
                }
            }
        }
    }
}

/// Downloads and parses the exchange's market-name listing.
async fn fetch_market_names(protocol: &dyn ExchangeProtocol, url: &str) -> Result<MarketNames> {
    let client = reqwest::Client::builder()
        .timeout(METADATA_TIMEOUT)
        .build()?;
    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    protocol.parse_markets(&body)
}

//! Shared test utilities: sample configuration and a local WebSocket server.

#![allow(dead_code)]

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tungstenite::Message as WsMessage;

use tickerboard::config::{AppConfig, CoinConfig};
use tickerboard::exchange::{Adapter, Outcome};
use tickerboard::tui::Message;

/// Upper bound for anything a test waits on.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

pub fn coin(symbol: &str, unit: &str, average_purchase_price: f64) -> CoinConfig {
    CoinConfig {
        symbol: symbol.to_string(),
        icon: String::new(),
        unit_currency: unit.to_string(),
        average_purchase_price,
    }
}

/// BTC and ETH against USDT, BTC with a cost basis.
pub fn usdt_config() -> AppConfig {
    AppConfig {
        coins: vec![coin("BTC", "USDT", 50_000.0), coin("ETH", "USDT", 0.0)],
        credentials: None,
        binance_quote: "USDT".to_string(),
    }
}

/// A Binance-shaped 24h ticker event.
pub fn binance_ticker(symbol: &str, last: &str) -> String {
    format!(
        r#"{{"e":"24hrTicker","E":1,"s":"{symbol}","c":"{last}","P":"1.5","x":"59000.00","h":"61000.00","l":"58000.00","q":"1000000.0"}}"#
    )
}

/// Handle to a WebSocket server on an ephemeral local port.
pub struct TestServer {
    pub url: String,
    /// First text frame of every accepted connection.
    pub subscriptions: mpsc::UnboundedReceiver<String>,
    /// One entry per connection the client closed.
    pub closed: mpsc::UnboundedReceiver<()>,
}

/// Starts a server that, for every connection, records the subscription,
/// sends `frames`, and then either hangs up or waits for the client to go.
pub async fn spawn_server(frames: Vec<String>, hang_up: bool) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    let (sub_tx, sub_rx) = mpsc::unbounded_channel();
    let (closed_tx, closed_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let Ok(mut ws) = accept_async(stream).await else {
                continue;
            };
            if let Some(Ok(WsMessage::Text(text))) = ws.next().await {
                let _ = sub_tx.send(text.as_str().to_owned());
            }
            for frame in &frames {
                let _ = ws.send(WsMessage::Text(frame.clone().into())).await;
            }
            if hang_up {
                let _ = ws.close(None).await;
                continue;
            }

            let closed_tx = closed_tx.clone();
            tokio::spawn(async move {
                while let Some(Ok(msg)) = ws.next().await {
                    if msg.is_close() {
                        break;
                    }
                }
                let _ = closed_tx.send(());
            });
        }
    });

    TestServer {
        url: format!("ws://{addr}"),
        subscriptions: sub_rx,
        closed: closed_rx,
    }
}

/// Feeds main-loop messages to the adapter until `done` returns true.
///
/// Panics if that takes longer than [`TEST_TIMEOUT`].
pub async fn drive_until<F>(
    adapter: &mut Adapter,
    rx: &mut mpsc::UnboundedReceiver<Message>,
    mut done: F,
) where
    F: FnMut(&Adapter, &Outcome) -> bool,
{
    let result = tokio::time::timeout(TEST_TIMEOUT, async {
        while let Some(message) = rx.recv().await {
            let outcome = match message {
                Message::Session {
                    generation, event, ..
                } => adapter.handle(generation, event),
                Message::ReconnectDue { generation, .. } => {
                    adapter
                        .handle_reconnect_due(generation)
                        .expect("Reconnect failed");
                    Outcome::StatusChanged
                }
                _ => Outcome::Ignored,
            };
            if done(adapter, &outcome) {
                return;
            }
        }
        panic!("message channel closed");
    })
    .await;
    result.expect("Timed out driving adapter");
}

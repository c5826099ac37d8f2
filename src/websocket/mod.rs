//! Async WebSocket plumbing shared by every exchange.
//!
//! This module is organized by concern:
//! - [`connection`] - Per-connection session task (metadata fetch, connect,
//!   subscribe, frame forwarding)

pub mod connection;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};
use tungstenite::Message;

use crate::Result;

pub use connection::{SessionEvent, SessionParams, spawn_session};

/// Write half of an exchange WebSocket connection.
pub type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Read half of an exchange WebSocket connection.
pub type WsReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Establishes a WebSocket connection to the given URL.
///
/// # Errors
///
/// Returns a [`TickerError`](crate::TickerError) if the connection or TLS handshake fails.
pub async fn connect(url: &str) -> Result<(WsWriter, WsReader)> {
    let (ws_stream, _) = connect_async(url).await?;
    info!(url, "WebSocket handshake completed");

    Ok(ws_stream.split())
}

/// Sends a text frame.
///
/// # Errors
///
/// Returns a [`TickerError`](crate::TickerError) if sending the message fails.
pub async fn send_text(write: &mut WsWriter, text: &str) -> Result<()> {
    debug!(text, "Sending frame");
    write.send(Message::Text(text.to_string().into())).await?;

    Ok(())
}

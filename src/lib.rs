//! Multi-exchange real-time crypto ticker board.
//!
//! Streams ticker updates from Bithumb, Upbit and Binance over WebSocket,
//! standardizes them into [`models::TickerRecord`]s, and renders a
//! debounced terminal table annotated with portfolio profit/loss.

pub mod aggregator;
pub mod cli;
pub mod config;
pub mod error;
pub mod exchange;
pub mod models;
pub mod notify;
pub mod scheduler;
pub mod tls;
pub mod tui;
pub mod websocket;

pub use error::{Result, TickerError};

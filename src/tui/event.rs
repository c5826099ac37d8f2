//! Event handling for the TUI.

use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;
use tracing::error;

use crate::exchange::Outcome;
use crate::models::ExchangeKind;
use crate::websocket::SessionEvent;

use super::app::App;

/// Events that can occur in the terminal.
#[derive(Debug)]
pub enum Event {
    /// A key was pressed.
    Key(KeyEvent),
    /// Terminal was resized.
    Resize(u16, u16),
}

/// Messages processed by the main loop, one per turn.
#[derive(Debug)]
pub enum Message {
    /// Input event from terminal.
    Input(Event),
    /// Something happened on an exchange connection.
    Session {
        exchange: ExchangeKind,
        generation: u64,
        event: SessionEvent,
    },
    /// A reconnect backoff elapsed.
    ReconnectDue {
        exchange: ExchangeKind,
        generation: u64,
    },
    /// The render scheduler's quiescence window elapsed.
    RedrawDue,
    /// Request to quit the application.
    Quit,
}

/// Actions the main loop performs outside of state updates.
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    /// Draw the current snapshot.
    Redraw,
}

/// Spawns a task that polls for terminal events and sends them to a channel.
pub fn spawn_event_reader(tx: mpsc::UnboundedSender<Message>) {
    tokio::spawn(async move {
        loop {
            // Poll for events with a 50ms timeout
            match tokio::task::spawn_blocking(|| {
                if event::poll(Duration::from_millis(50)).unwrap_or(false) {
                    event::read().ok()
                } else {
                    None
                }
            })
            .await
            {
                Ok(Some(CrosstermEvent::Key(key))) => {
                    if tx.send(Message::Input(Event::Key(key))).is_err() {
                        break;
                    }
                }
                Ok(Some(CrosstermEvent::Resize(w, h))) => {
                    if tx.send(Message::Input(Event::Resize(w, h))).is_err() {
                        break;
                    }
                }
                Ok(_) => {
                    if tx.is_closed() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });
}

/// Updates application state based on a message.
pub fn update(app: &mut App, message: Message) -> Option<Action> {
    match message {
        Message::Input(event) => handle_input(app, event),
        Message::Session {
            exchange,
            generation,
            event,
        } => {
            match app.aggregator.handle(exchange, generation, event) {
                Outcome::Ignored => {}
                Outcome::StatusChanged => {
                    app.scheduler.signal();
                }
                Outcome::Updated(symbol) => {
                    app.check_threshold(&symbol);
                    app.scheduler.signal();
                }
            }
            None
        }
        Message::ReconnectDue {
            exchange,
            generation,
        } => {
            match app.aggregator.handle_reconnect_due(exchange, generation) {
                Ok(true) => {
                    app.scheduler.signal();
                }
                Ok(false) => {}
                Err(e) => error!(%exchange, "Reconnect failed: {e}"),
            }
            None
        }
        Message::RedrawDue => app.scheduler.fire().then_some(Action::Redraw),
        Message::Quit => {
            app.should_quit = true;
            None
        }
    }
}

/// Handles input events and updates application state.
fn handle_input(app: &mut App, event: Event) -> Option<Action> {
    match event {
        Event::Key(key) => handle_key(app, key),
        Event::Resize(_, height) => {
            app.terminal_height = height;
            app.scheduler.signal();
            None
        }
    }
}

/// Handles key press events.
fn handle_key(app: &mut App, key: KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }
        KeyCode::Char('q') | KeyCode::Esc => {
            app.should_quit = true;
        }
        KeyCode::Char('s') => app.toggle_sort(),
        KeyCode::Char(c) => {
            if let Some(kind) = c
                .to_digit(10)
                .and_then(|d| ExchangeKind::from_menu_index(d as usize))
            {
                app.switch_exchange(kind);
            }
        }
        _ => {}
    }
    None
}

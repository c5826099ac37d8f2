//! Terminal user interface.
//!
//! Provides the Ratatui-based ticker board: exchange menu, connection
//! status and a debounced ticker table.

pub mod app;
pub mod components;
pub mod event;
pub mod terminal;
pub mod ui;

pub use app::{App, DisplayOptions};
pub use event::{Action, Event, Message, spawn_event_reader, update};
pub use terminal::{Tui, restore_terminal, setup_terminal};
pub use ui::render;

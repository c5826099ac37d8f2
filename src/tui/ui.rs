//! Main UI rendering coordinator.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};

use super::app::App;
use super::components::{menu_bar, status_bar, ticker_table};

/// Renders the entire application UI from the current snapshot.
pub fn render(frame: &mut Frame, app: &App) {
    let snapshot = app.snapshot();
    let limit = app.options.effective_limit(app.terminal_height);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Exchange menu
            Constraint::Length(1), // Status bar
            Constraint::Min(3),    // Ticker table
        ])
        .split(frame.area());

    menu_bar::render(frame, layout[0], snapshot.exchange);
    status_bar::render(frame, layout[1], app, snapshot.state);
    ticker_table::render(
        frame,
        layout[2],
        snapshot.exchange.name(),
        &snapshot.records,
        app.options.sort_by,
        limit,
    );
}

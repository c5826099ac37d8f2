//! Status bar component.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::exchange::ConnectionState;
use crate::tui::app::App;

/// Renders the status bar.
pub fn render(frame: &mut Frame, area: Rect, app: &App, state: ConnectionState) {
    let status_color = match state {
        ConnectionState::Open => Color::Green,
        ConnectionState::Connecting | ConnectionState::Backoff => Color::Yellow,
        ConnectionState::Idle => Color::Red,
    };

    let auth_label = if app.authenticated {
        Span::styled(" Auth ", Style::default().fg(Color::Green))
    } else {
        Span::styled(" No Auth ", Style::default().fg(Color::Gray))
    };

    let notification_span = match &app.last_notification {
        Some(n) => Span::styled(
            format!(" {}: {} ", n.title, n.message),
            Style::default().fg(Color::Yellow),
        ),
        None => Span::raw(""),
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", state.label()),
            Style::default().fg(status_color),
        ),
        Span::raw("│"),
        auth_label,
        Span::raw("│"),
        Span::raw(format!(" Sort: {} ", app.options.sort_by.label())),
        Span::raw("│"),
        notification_span,
    ]);

    let para = Paragraph::new(line).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(para, area);
}

//! Exchange menu bar component.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::models::ExchangeKind;

/// Renders the exchange menu with the active exchange highlighted.
pub fn render(frame: &mut Frame, area: Rect, active: ExchangeKind) {
    let mut spans: Vec<Span> = Vec::new();

    for (i, kind) in ExchangeKind::ALL.iter().enumerate() {
        let style = if *kind == active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };

        spans.push(Span::styled(format!(" {} {} ", i + 1, kind.name()), style));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled(" s Sort ", Style::default().fg(Color::DarkGray)));
    spans.push(Span::styled(" q Quit ", Style::default().fg(Color::DarkGray)));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

//! Ticker table component.
//!
//! Row selection and formatting are pure functions of the snapshot so they
//! can be tested without a terminal; [`render`] only lays them out.

use std::cmp::Ordering;

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};

use crate::cli::SortBy;
use crate::exchange::adapter::RecordMap;
use crate::models::{Direction, MarketSentiment, TickerRecord};

const HEADERS: [&str; 9] = [
    "Name", "Price", "Power", "P/L", "Change", "Change amt", "Prev close", "High", "Low",
];

/// Rows to draw and how many were left out.
#[derive(Debug)]
pub struct VisibleRows<'a> {
    pub rows: Vec<&'a TickerRecord>,
    pub hidden: usize,
}

/// Sorts the records and cuts them to `limit`.
pub fn visible_rows(records: &RecordMap, sort_by: SortBy, limit: usize) -> VisibleRows<'_> {
    let mut rows: Vec<&TickerRecord> = records.values().collect();
    match sort_by {
        SortBy::Name => rows.sort_by(|a, b| a.symbol.cmp(&b.symbol)),
        SortBy::Rate => rows.sort_by(|a, b| compare_rate(a, b).then_with(|| a.symbol.cmp(&b.symbol))),
    }
    let hidden = rows.len().saturating_sub(limit);
    rows.truncate(limit);
    VisibleRows { rows, hidden }
}

/// Change rate descending, unknown last.
fn compare_rate(a: &TickerRecord, b: &TickerRecord) -> Ordering {
    match (a.change_rate_pct, b.change_rate_pct) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Formats with thousands separators and at most three decimals.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }

    let fixed = format!("{:.3}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    if value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        out.push('-');
    }
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

/// Formats a signed percentage, or `-` when unknown.
pub fn format_pct(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:+.2}%"),
        _ => "-".to_string(),
    }
}

fn format_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), format_number)
}

/// Price with its percentage relative to the previous close.
fn format_extreme(price: Option<f64>, pct: Option<f64>) -> String {
    match (price, pct) {
        (Some(price), Some(_)) => format!("{} ({})", format_number(price), format_pct(pct)),
        (Some(price), None) => format_number(price),
        (None, _) => "-".to_string(),
    }
}

fn sign_color(value: Option<f64>) -> Color {
    match value {
        Some(v) if v > 0.0 => Color::Red,
        Some(v) if v < 0.0 => Color::Blue,
        _ => Color::White,
    }
}

fn direction_color(direction: Direction) -> Color {
    match direction {
        Direction::Up => Color::Red,
        Direction::Down => Color::Blue,
        Direction::Flat | Direction::Unknown => Color::White,
    }
}

/// Header line summarizing the whole snapshot.
pub fn sentiment_line(records: &RecordMap) -> Line<'static> {
    match MarketSentiment::from_records(records.values()) {
        Some(sentiment) => {
            let mut spans = vec![
                Span::raw(" Market: "),
                Span::styled(
                    sentiment.level.label(),
                    Style::default()
                        .fg(sign_color(Some(sentiment.weighted_change_pct)))
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!(" ({})", format_pct(Some(sentiment.weighted_change_pct)))),
            ];
            if let Some(power) = sentiment.average_volume_power {
                spans.push(Span::raw(format!("  Avg power: {power:.2}")));
            }
            Line::from(spans)
        }
        None => Line::from(Span::styled(
            " Market: no data",
            Style::default().fg(Color::DarkGray),
        )),
    }
}

fn row(record: &TickerRecord) -> Row<'static> {
    let name = if record.icon.is_empty() {
        record.display_name.clone()
    } else {
        format!("{} {}", record.icon, record.display_name)
    };
    let rate_color = sign_color(record.change_rate_pct);

    Row::new(vec![
        Cell::from(name),
        Cell::from(format_number(record.current_price))
            .style(Style::default().fg(direction_color(record.direction()))),
        Cell::from(record.volume_power.map_or_else(|| "-".to_string(), |p| format!("{p:.2}"))),
        Cell::from(format_pct(record.profit_loss_rate_pct))
            .style(Style::default().fg(sign_color(record.profit_loss_rate_pct))),
        Cell::from(format_pct(record.change_rate_pct)).style(Style::default().fg(rate_color)),
        Cell::from(format_optional(record.change_amount)).style(Style::default().fg(rate_color)),
        Cell::from(format_optional(record.prev_close_price)),
        Cell::from(format_extreme(record.high_price, record.high_change_pct())),
        Cell::from(format_extreme(record.low_price, record.low_change_pct())),
    ])
}

/// Renders the snapshot of one exchange. Never mutates `records`.
pub fn render(
    frame: &mut Frame,
    area: Rect,
    exchange: &str,
    records: &RecordMap,
    sort_by: SortBy,
    limit: usize,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {exchange} "))
        .title_bottom(sentiment_line(records));

    if records.is_empty() {
        let para = Paragraph::new(Line::from(Span::styled(
            " Waiting for data...",
            Style::default().fg(Color::DarkGray),
        )))
        .block(block);
        frame.render_widget(para, area);
        return;
    }

    let visible = visible_rows(records, sort_by, limit);
    let [table_area, footer_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(u16::from(visible.hidden > 0))])
            .areas(area);

    let header = Row::new(HEADERS.iter().map(|h| Cell::from(*h)))
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = visible.rows.iter().map(|r| row(r)).collect();
    let widths = [
        Constraint::Min(14),
        Constraint::Length(16),
        Constraint::Length(8),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(14),
        Constraint::Length(16),
        Constraint::Length(24),
        Constraint::Length(24),
    ];
    let table = Table::new(rows, widths).header(header).block(block);
    frame.render_widget(table, table_area);

    if visible.hidden > 0 {
        let footer = Paragraph::new(Line::from(Span::styled(
            format!(" ... {} more (use --limit or resize)", visible.hidden),
            Style::default().fg(Color::DarkGray),
        )));
        frame.render_widget(footer, footer_area);
    }
}

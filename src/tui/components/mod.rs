//! Reusable screen sections.

pub mod menu_bar;
pub mod status_bar;
pub mod ticker_table;

//! Command-line flags.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::models::ExchangeKind;

/// Row ordering for the ticker table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SortBy {
    /// Symbol, ascending.
    Name,
    /// 24h change rate, descending; unknown rates last.
    #[default]
    Rate,
}

impl SortBy {
    pub fn toggled(self) -> Self {
        match self {
            Self::Name => Self::Rate,
            Self::Rate => Self::Name,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Rate => "rate",
        }
    }
}

/// Real-time crypto ticker board for Bithumb, Upbit and Binance
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Sort rows by symbol name or by change rate
    #[arg(short, long, value_enum, default_value_t = SortBy::Rate)]
    pub sort_by: SortBy,

    /// Maximum number of rows (defaults to what fits the terminal)
    #[arg(short, long, value_parser = parse_limit)]
    pub limit: Option<usize>,

    /// Exchange shown at startup
    #[arg(short, long, default_value = "bithumb", value_parser = parse_exchange)]
    pub exchange: ExchangeKind,

    /// Configuration file path (can also be set via TICKERBOARD_CONFIG)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log file (defaults to ~/.tickerboard/tickerboard.log)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

fn parse_limit(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("limit must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

fn parse_exchange(value: &str) -> Result<ExchangeKind, String> {
    ExchangeKind::from_name(value).ok_or_else(|| {
        let names: Vec<_> = ExchangeKind::ALL.iter().map(|k| k.name().to_lowercase()).collect();
        format!("unknown exchange '{value}' (expected one of: {})", names.join(", "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["tickerboard"]).unwrap();
        assert_eq!(cli.sort_by, SortBy::Rate);
        assert_eq!(cli.limit, None);
        assert_eq!(cli.exchange, ExchangeKind::Bithumb);
        assert!(cli.config.is_none());
    }

    #[test]
    fn parses_all_flags() {
        let cli = Cli::try_parse_from([
            "tickerboard",
            "--sort-by",
            "name",
            "--limit",
            "5",
            "--exchange",
            "Upbit",
            "--config",
            "/tmp/c.json",
        ])
        .unwrap();
        assert_eq!(cli.sort_by, SortBy::Name);
        assert_eq!(cli.limit, Some(5));
        assert_eq!(cli.exchange, ExchangeKind::Upbit);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.json")));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Cli::try_parse_from(["tickerboard", "--limit", "0"]).is_err());
        assert!(Cli::try_parse_from(["tickerboard", "--limit", "-3"]).is_err());
        assert!(Cli::try_parse_from(["tickerboard", "--sort-by", "volume"]).is_err());
        assert!(Cli::try_parse_from(["tickerboard", "--exchange", "kraken"]).is_err());
    }

    #[test]
    fn sort_toggles() {
        assert_eq!(SortBy::Rate.toggled(), SortBy::Name);
        assert_eq!(SortBy::Name.toggled().label(), "rate");
    }
}

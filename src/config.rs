//! Application configuration loaded from a JSON file plus environment
//! variables.
//!
//! The file is searched in this order:
//! 1. an explicit path (`--config`)
//! 2. `TICKERBOARD_CONFIG`
//! 3. `./config.json`
//! 4. `~/.tickerboard/config.json`
//!
//! When none exists a starter file is written to the home location.
//!
//! Credentials are optional. They may be set in the file or overridden with
//! `TICKERBOARD_ACCESS_KEY` / `TICKERBOARD_SECRET_KEY`; when one is set both
//! must be present.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;
use zeroize::Zeroizing;

use crate::{Result, TickerError};

/// File name looked up in the working directory and the home directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Per-user directory under `$HOME`.
pub const CONFIG_DIR_NAME: &str = ".tickerboard";

/// Quote asset used to build Binance pairs when the file does not set one.
const DEFAULT_BINANCE_QUOTE: &str = "USDT";

/// Starter configuration written when no file exists yet.
const DEFAULT_CONFIG: &str = r#"{
  "coins": [
    { "symbol": "BTC", "icon": "₿", "unit_currency": "KRW", "averagePurchasePrice": 0 },
    { "symbol": "ETH", "icon": "Ξ", "unit_currency": "KRW", "averagePurchasePrice": 0 },
    { "symbol": "XRP", "icon": "✕", "unit_currency": "KRW", "averagePurchasePrice": 0 },
    { "symbol": "SOL", "icon": "◎", "unit_currency": "KRW", "averagePurchasePrice": 0 },
    { "symbol": "DOGE", "icon": "Ð", "unit_currency": "KRW", "averagePurchasePrice": 0 },
    { "symbol": "ADA", "icon": "₳", "unit_currency": "KRW", "averagePurchasePrice": 0 }
  ]
}
"#;

/// Top-level application configuration.
///
/// Immutable once loaded; shared with adapters behind an `Arc`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub coins: Vec<CoinConfig>,
    pub credentials: Option<Credentials>,
    /// Quote asset for Binance pairs (e.g. `USDT`).
    pub binance_quote: String,
}

/// One tracked coin.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CoinConfig {
    pub symbol: String,
    #[serde(default)]
    pub icon: String,
    pub unit_currency: String,
    #[serde(rename = "averagePurchasePrice", default)]
    pub average_purchase_price: f64,
}

impl CoinConfig {
    /// Canonical `{BASE}_{QUOTE}` market identifier, e.g. `BTC_KRW`.
    pub fn market(&self) -> String {
        format!(
            "{}_{}",
            self.symbol.to_uppercase(),
            self.unit_currency.to_uppercase()
        )
    }

    /// Cost basis if one was configured. Zero, negative and non-finite
    /// values mean "not held".
    pub fn cost_basis(&self) -> Option<f64> {
        let price = self.average_purchase_price;
        (price.is_finite() && price > 0.0).then_some(price)
    }
}

/// Exchange API credentials. Only used to flag an authenticated session.
#[derive(Clone)]
pub struct Credentials {
    pub access_key: Zeroizing<String>,
    pub secret_key: Zeroizing<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize)]
struct RawConfig {
    coins: Vec<CoinConfig>,
    #[serde(default)]
    credentials: Option<RawCredentials>,
    #[serde(default)]
    binance_quote: Option<String>,
}

#[derive(Deserialize)]
struct RawCredentials {
    #[serde(default)]
    access_key: Option<String>,
    #[serde(default)]
    secret_key: Option<String>,
}

impl AppConfig {
    /// Returns `true` if both credential halves are present.
    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }
}

/// Parses configuration JSON, applying credential environment overrides.
///
/// # Errors
///
/// Returns [`TickerError::Config`] if the JSON is malformed, the coin list
/// contains an entry without a symbol or unit currency, or only one
/// credential half is set.
pub fn parse_config(content: &str) -> Result<AppConfig> {
    let raw: RawConfig = serde_json::from_str(content)
        .map_err(|e| TickerError::Config(format!("invalid config JSON: {e}")))?;

    if let Some(coin) = raw
        .coins
        .iter()
        .find(|c| c.symbol.trim().is_empty() || c.unit_currency.trim().is_empty())
    {
        return Err(TickerError::Config(format!(
            "coin entry {coin:?} needs both symbol and unit_currency"
        )));
    }

    let (file_key, file_secret) = match raw.credentials {
        Some(c) => (
            c.access_key.filter(|s| !s.is_empty()),
            c.secret_key.filter(|s| !s.is_empty()),
        ),
        None => (None, None),
    };
    let access_key = non_empty_var("TICKERBOARD_ACCESS_KEY").or(file_key);
    let secret_key = non_empty_var("TICKERBOARD_SECRET_KEY").or(file_secret);

    let credentials = match (access_key, secret_key) {
        (Some(access_key), Some(secret_key)) => Some(Credentials {
            access_key: Zeroizing::new(access_key),
            secret_key: Zeroizing::new(secret_key),
        }),
        (Some(_), None) => {
            return Err(TickerError::Config(
                "access key is set but secret key is missing".to_string(),
            ));
        }
        (None, Some(_)) => {
            return Err(TickerError::Config(
                "secret key is set but access key is missing".to_string(),
            ));
        }
        (None, None) => None,
    };

    let binance_quote = raw
        .binance_quote
        .filter(|q| !q.trim().is_empty())
        .map(|q| q.trim().to_uppercase())
        .unwrap_or_else(|| DEFAULT_BINANCE_QUOTE.to_string());

    Ok(AppConfig {
        coins: raw.coins,
        credentials,
        binance_quote,
    })
}

/// Finds the configuration file to use, if any exists.
pub fn resolve_config_path(
    explicit: Option<&Path>,
    cwd: &Path,
    home: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = non_empty_var("TICKERBOARD_CONFIG") {
        return Some(PathBuf::from(path));
    }

    let local = cwd.join(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    home.map(|h| h.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .filter(|p| p.is_file())
}

/// Writes the starter configuration under `home` and returns its path.
///
/// # Errors
///
/// Returns [`TickerError::Io`] if the directory or file cannot be created.
pub fn bootstrap_default(home: &Path) -> Result<PathBuf> {
    let dir = home.join(CONFIG_DIR_NAME);
    std::fs::create_dir_all(&dir)
        .map_err(|e| TickerError::Io(format!("failed to create {}: {e}", dir.display())))?;

    let path = dir.join(CONFIG_FILE_NAME);
    std::fs::write(&path, DEFAULT_CONFIG)
        .map_err(|e| TickerError::Io(format!("failed to write {}: {e}", path.display())))?;
    info!(path = %path.display(), "Created default config file");

    Ok(path)
}

/// Locates, bootstraps if needed, reads and parses the configuration.
///
/// # Errors
///
/// Returns [`TickerError::Config`] if no file can be found or created, or
/// if it cannot be read or parsed.
pub fn load_config(explicit: Option<&Path>) -> Result<(AppConfig, PathBuf)> {
    let cwd = std::env::current_dir()
        .map_err(|e| TickerError::Config(format!("cannot read working directory: {e}")))?;
    let home = home_dir();

    let path = match resolve_config_path(explicit, &cwd, home.as_deref()) {
        Some(path) => path,
        None => {
            let home = home.ok_or_else(|| {
                TickerError::Config(format!(
                    "no {CONFIG_FILE_NAME} found and home directory is unknown"
                ))
            })?;
            bootstrap_default(&home)?
        }
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| TickerError::Config(format!("cannot read {}: {e}", path.display())))?;
    let config = parse_config(&content)
        .map_err(|e| TickerError::Config(format!("{}: {e}", path.display())))?;
    info!(path = %path.display(), coins = config.coins.len(), "Loaded config");

    Ok((config, path))
}

/// Returns the user's home directory from the environment.
pub fn home_dir() -> Option<PathBuf> {
    non_empty_var("HOME")
        .or_else(|| non_empty_var("USERPROFILE"))
        .map(PathBuf::from)
}

/// Returns the value of an environment variable if it exists and is non-empty.
pub(crate) fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    /// Serializes every test that touches the process environment.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Helper that temporarily sets env vars, runs `f`, then restores originals.
    ///
    /// Holds [`ENV_LOCK`] for the whole call so parallel tests in this module
    /// never observe each other's variables.
    fn with_env<F: FnOnce()>(vars: &[(&str, Option<&str>)], f: F) {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let originals: Vec<(&str, Option<String>)> = vars
            .iter()
            .map(|(k, _)| (*k, std::env::var(k).ok()))
            .collect();

        for (k, v) in vars {
            // SAFETY: ENV_LOCK is held, no other test in this module reads the env.
            unsafe {
                match v {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }

        f();

        for (k, original) in originals {
            // SAFETY: restoring original values, same single-threaded context.
            unsafe {
                match original {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }
    }

    const NO_CREDENTIAL_ENV: [(&str, Option<&str>); 2] = [
        ("TICKERBOARD_ACCESS_KEY", None),
        ("TICKERBOARD_SECRET_KEY", None),
    ];

    #[test]
    fn default_config_parses() {
        with_env(&NO_CREDENTIAL_ENV, || {
            let config = parse_config(DEFAULT_CONFIG).unwrap();
            assert_eq!(config.coins.len(), 6);
            assert_eq!(config.coins[0].market(), "BTC_KRW");
            assert_eq!(config.binance_quote, "USDT");
            assert!(!config.is_authenticated());
        });
    }

    #[test]
    fn cost_basis_requires_positive_price() {
        let mut coin = CoinConfig {
            symbol: "btc".to_string(),
            icon: String::new(),
            unit_currency: "krw".to_string(),
            average_purchase_price: 0.0,
        };
        assert_eq!(coin.market(), "BTC_KRW");
        assert_eq!(coin.cost_basis(), None);

        coin.average_purchase_price = -5.0;
        assert_eq!(coin.cost_basis(), None);

        coin.average_purchase_price = f64::NAN;
        assert_eq!(coin.cost_basis(), None);

        coin.average_purchase_price = 95_000_000.0;
        assert_eq!(coin.cost_basis(), Some(95_000_000.0));
    }

    #[test]
    fn loads_credentials_from_file() {
        with_env(&NO_CREDENTIAL_ENV, || {
            let json = r#"{
                "coins": [],
                "credentials": { "access_key": "file-key", "secret_key": "file-secret" },
                "binance_quote": "fdusd"
            }"#;
            let config = parse_config(json).unwrap();
            let creds = config.credentials.unwrap();
            assert_eq!(creds.access_key.as_str(), "file-key");
            assert_eq!(creds.secret_key.as_str(), "file-secret");
            assert_eq!(config.binance_quote, "FDUSD");
        });
    }

    #[test]
    fn env_credentials_override_file() {
        with_env(
            &[
                ("TICKERBOARD_ACCESS_KEY", Some("env-key")),
                ("TICKERBOARD_SECRET_KEY", Some("env-secret")),
            ],
            || {
                let json = r#"{
                    "coins": [],
                    "credentials": { "access_key": "file-key", "secret_key": "file-secret" }
                }"#;
                let creds = parse_config(json).unwrap().credentials.unwrap();
                assert_eq!(creds.access_key.as_str(), "env-key");
                assert_eq!(creds.secret_key.as_str(), "env-secret");
            },
        );
    }

    #[test]
    fn rejects_key_without_secret() {
        with_env(
            &[
                ("TICKERBOARD_ACCESS_KEY", Some("key-only")),
                ("TICKERBOARD_SECRET_KEY", None),
            ],
            || {
                let err = parse_config(r#"{"coins": []}"#).unwrap_err();
                assert!(err.to_string().contains("secret key is missing"));
            },
        );
    }

    #[test]
    fn rejects_secret_without_key() {
        with_env(&NO_CREDENTIAL_ENV, || {
            let json = r#"{"coins": [], "credentials": {"secret_key": "s"}}"#;
            let err = parse_config(json).unwrap_err();
            assert!(err.to_string().contains("access key is missing"));
        });
    }

    #[test]
    fn empty_values_treated_as_absent() {
        with_env(
            &[
                ("TICKERBOARD_ACCESS_KEY", Some("")),
                ("TICKERBOARD_SECRET_KEY", Some("")),
            ],
            || {
                let json = r#"{"coins": [], "credentials": {"access_key": "", "secret_key": ""}}"#;
                let config = parse_config(json).unwrap();
                assert!(config.credentials.is_none());
            },
        );
    }

    #[test]
    fn rejects_coin_without_unit_currency() {
        with_env(&NO_CREDENTIAL_ENV, || {
            let json = r#"{"coins": [{"symbol": "BTC", "unit_currency": ""}]}"#;
            assert!(parse_config(json).is_err());
        });
    }

    #[test]
    fn rejects_malformed_json() {
        let err = parse_config("{ not json").unwrap_err();
        assert!(matches!(err, TickerError::Config(_)));
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let creds = Credentials {
            access_key: Zeroizing::new("top-secret-key".to_string()),
            secret_key: Zeroizing::new("top-secret".to_string()),
        };
        let debug = format!("{creds:?}");
        assert!(!debug.contains("top-secret"));
    }
}

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tickerboard::aggregator::Aggregator;
use tickerboard::cli::Cli;
use tickerboard::config::{CONFIG_DIR_NAME, home_dir, load_config};
use tickerboard::scheduler::RenderScheduler;
use tickerboard::tui::{self, Action, App, DisplayOptions, Message};
use tickerboard::{Result, TickerError, tls};

const LOG_FILE_NAME: &str = "tickerboard.log";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to a file so they never tear the table.
    let log_path = cli.log_file.clone().unwrap_or_else(default_log_path);
    init_logging(&log_path)?;
    tls::init_crypto();

    info!("Starting tickerboard v{}", env!("CARGO_PKG_VERSION"));

    let (config, config_path) = load_config(cli.config.as_deref())?;
    info!(
        path = %config_path.display(),
        coins = config.coins.len(),
        authenticated = config.is_authenticated(),
        "Configuration loaded"
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    let aggregator = Aggregator::new(Arc::new(config), cli.exchange, &tx);
    let options = DisplayOptions {
        sort_by: cli.sort_by,
        limit: cli.limit,
    };
    let mut app = App::new(aggregator, RenderScheduler::new(tx.clone()), options);

    let mut terminal = tui::setup_terminal()?;
    app.terminal_height = terminal
        .size()
        .map(|size| size.height)
        .unwrap_or(app.terminal_height);

    tui::spawn_event_reader(tx.clone());
    app.switch_exchange(cli.exchange);

    let result = run(&mut terminal, &mut app, &mut rx).await;

    app.aggregator.shutdown();
    app.scheduler.cancel();
    tui::restore_terminal(&mut terminal)?;

    if let Err(ref e) = result {
        error!("Exited with error: {e}");
    }
    info!("Shut down");
    result
}

/// Processes messages one at a time until the user quits.
async fn run(terminal: &mut tui::Tui, app: &mut App, rx: &mut mpsc::UnboundedReceiver<Message>) -> Result<()> {
    draw(terminal, app)?;

    while let Some(message) = rx.recv().await {
        if let Some(Action::Redraw) = tui::update(app, message) {
            draw(terminal, app)?;
        }
        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn draw(terminal: &mut tui::Tui, app: &App) -> Result<()> {
    terminal
        .draw(|frame| tui::render(frame, app))
        .map_err(|e| TickerError::Io(format!("failed to draw: {e}")))?;
    Ok(())
}

fn default_log_path() -> PathBuf {
    home_dir()
        .map(|home| home.join(CONFIG_DIR_NAME))
        .unwrap_or_else(std::env::temp_dir)
        .join(LOG_FILE_NAME)
}

fn init_logging(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir)
            .map_err(|e| TickerError::Io(format!("failed to create {}: {e}", dir.display())))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| TickerError::Io(format!("failed to open log {}: {e}", path.display())))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

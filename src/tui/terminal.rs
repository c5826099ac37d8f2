//! Terminal setup and teardown utilities.

use std::io::{self, IsTerminal, Stdout};

use crossterm::{
    cursor, execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::{Result, TickerError};

/// Type alias for our terminal backend.
pub type Tui = Terminal<CrosstermBackend<Stdout>>;

fn io_error(context: &'static str) -> impl Fn(io::Error) -> TickerError {
    move |e| TickerError::Io(format!("{context}: {e}"))
}

/// Enables raw mode, switches to the alternate screen and hides the cursor.
///
/// Also installs a panic hook that restores the terminal first, so a panic
/// message is readable instead of being lost in raw mode.
///
/// # Errors
///
/// Returns [`TickerError::Io`] if stdout is not a TTY or initialization fails.
pub fn setup_terminal() -> Result<Tui> {
    if !io::stdout().is_terminal() {
        return Err(TickerError::Io(
            "the ticker board needs an interactive terminal (TTY)".to_string(),
        ));
    }

    enable_raw_mode().map_err(io_error("failed to enable raw mode"))?;

    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen, cursor::Hide) {
        let _ = disable_raw_mode();
        return Err(io_error("failed to enter alternate screen")(e));
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = reset();
        previous_hook(info);
    }));

    Terminal::new(CrosstermBackend::new(stdout)).map_err(|e| {
        let _ = reset();
        io_error("failed to create terminal")(e)
    })
}

/// Restores the terminal to its original state.
///
/// # Errors
///
/// Returns [`TickerError::Io`] if restoration fails.
pub fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    reset()?;
    terminal
        .show_cursor()
        .map_err(io_error("failed to show cursor"))
}

fn reset() -> Result<()> {
    disable_raw_mode().map_err(io_error("failed to disable raw mode"))?;
    execute!(io::stdout(), LeaveAlternateScreen, cursor::Show)
        .map_err(io_error("failed to leave alternate screen"))
}

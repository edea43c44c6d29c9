//! Terminal session around the [`ksw_core::Selector`].
//!
//! Owns raw mode and the alternate screen for the lifetime of one
//! picker run; the terminal is restored even when the event loop bails.

mod app;

pub use app::PickerParams;

use anyhow::Result;
use crossterm::execute;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use ksw_core::Outcome;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io;
use std::io::Stdout;
use tracing::warn;

/// Runs one interactive picker session and reports how it ended.
pub fn run_picker(params: PickerParams) -> Result<Outcome> {
    let mut terminal = setup_terminal()?;
    let result = app::App::new(params).run(&mut terminal);
    restore_terminal();
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal() {
    if let Err(err) = disable_raw_mode() {
        warn!("failed to disable raw mode: {err}");
    }
    if let Err(err) = execute!(io::stdout(), LeaveAlternateScreen) {
        warn!("failed to leave alternate screen: {err}");
    }
}

pub mod app;
mod ui;
mod helpers;

use crate::settings::DisplaySettings;
use anyhow::{Context, Result};
use app::App;
use crossterm::{
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    execute,
    cursor::{SetCursorStyle, Show},
};
use log::info;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Write};
use std::panic;


pub(crate) fn run_tui(settings: DisplaySettings) -> Result<()> {
    let mut terminal = setup_terminal().context("failed to prepare the terminal")?;
    install_panic_hook();
    let mut app = App::new(settings);
    info!("tui started, language {}", settings.language.code());

    // ошибки цикла не мешают восстановить терминал, паники ловит хук
    let outcome = ui::run_ui_loop(&mut terminal, &mut app);

    restore_terminal(&mut terminal)?;
    outcome
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, SetCursorStyle::BlinkingBar)?;
    Terminal::new(CrosstermBackend::new(stdout)).map_err(Into::into)
}

fn leave_screen<W: Write>(out: &mut W) -> io::Result<()> {
    execute!(out, LeaveAlternateScreen, Show, SetCursorStyle::DefaultUserShape)
}

fn install_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = leave_screen(&mut io::stdout());
        previous(info);
    }));
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    leave_screen(terminal.backend_mut())?;
    Ok(())
}

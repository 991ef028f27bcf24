use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use time::OffsetDateTime;

use crate::clock::{Clock, SystemClock, Tick, Ticker};
use crate::dashboard::Dashboard;
use crate::error::{CoreError, RemoteError};
use crate::lock::{self, LockState, LockView};
use crate::model::{DetailState, ItemId, Origin, Rocket};
use crate::remote::{RemoteClient, RocketApi};
use crate::session::Session;
use crate::store::LocalStore;

mod app;
use app::{App, Focus, StatusKind};

mod event_loop;
mod layout;
mod render;
mod worker;
use worker::{Done, Worker};

pub(crate) fn run(store: LocalStore) -> Result<()> {
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        anyhow::bail!("TUI requires an interactive terminal (TTY)");
    }

    let mut app = App::load(store)?;

    let mut stdout = io::stdout();
    enable_raw_mode().context("enable raw mode")?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    app.refresh_all();
    let res = event_loop::run_loop(&mut terminal, &mut app);

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    res
}

fn state_color(state: LockState) -> Color {
    match state {
        LockState::Locked => Color::Gray,
        LockState::Unlockable => Color::Yellow,
        LockState::Unlocked => Color::Green,
    }
}

/// Bordered pane with `header` as its title; returns the inner area.
fn render_pane(frame: &mut ratatui::Frame, header: Line<'_>, area: Rect) -> Rect {
    let outer = Block::default().borders(Borders::ALL).title(header);
    let inner = outer.inner(area);
    frame.render_widget(outer, area);
    inner
}

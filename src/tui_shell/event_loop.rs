use super::*;

pub(super) fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        app.pump();
        app.poll_tick(Instant::now());

        let frame = terminal
            .draw(|f| super::render::draw(f, app))
            .context("draw")?;
        app.screen = frame.area;
        if app.quit {
            return Ok(());
        }

        let wait = app
            .until_next_tick(Instant::now())
            .min(Duration::from_millis(50));
        if event::poll(wait).context("poll")? {
            match event::read().context("read event")? {
                Event::Key(k) if k.kind == KeyEventKind::Press => handle_key(app, k),
                Event::Mouse(m) => handle_mouse(app, m),
                _ => {}
            }
        }
    }
}

pub(super) fn handle_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit = true,
        KeyCode::Esc => {
            if app.dash.is_dragging() {
                app.cancel_drag();
            } else if app.focus == Focus::Grid {
                app.toggle_focus();
            }
        }
        KeyCode::Tab => app.next_tab(),
        KeyCode::Char('g') => app.toggle_focus(),
        KeyCode::Char('r') => {
            app.refresh_all();
            app.info("refreshing...");
        }
        KeyCode::Char('u') => app.unlock_selected(),
        KeyCode::Char('v') => app.toggle_selected(),
        KeyCode::Enter => app.open_detail(),
        KeyCode::Char(' ') if app.focus == Focus::Grid => app.pick_or_drop(),
        KeyCode::Up | KeyCode::Char('k') => app.move_up(),
        KeyCode::Down | KeyCode::Char('j') => app.move_down(),
        KeyCode::Left | KeyCode::Char('h') => app.move_left(),
        KeyCode::Right | KeyCode::Char('l') => app.move_right(),
        _ => {}
    }
}

pub(super) fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let grid = layout::panes(app.screen).grid;
    let slot = layout::slot_at(grid, mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(i) = slot {
                app.focus = Focus::Grid;
                app.cursor = i;
                app.dash.drag_start(i);
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => match slot {
            Some(i) => {
                app.cursor = i;
                app.dash.drag_over(i);
            }
            None => {
                if let Some(over) = app.dash.drag_target() {
                    app.dash.drag_leave(over);
                }
            }
        },
        MouseEventKind::Up(MouseButton::Left) => match slot {
            Some(i) => app.drop_at(i),
            None => app.cancel_drag(),
        },
        _ => {}
    }
}

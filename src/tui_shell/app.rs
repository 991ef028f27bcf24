use crate::chest::ListLoad;
use crate::display::{GRID_SLOTS, Settle};
use crate::lock::Transition;

use super::worker::SharedApi;
use super::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Focus {
    List,
    Grid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum StatusKind {
    Info,
    Error,
}

#[derive(Clone, Debug)]
pub(super) struct Status {
    pub(super) kind: StatusKind,
    pub(super) text: String,
    pub(super) at: OffsetDateTime,
}

pub(super) struct App {
    pub(super) store: Option<LocalStore>,
    pub(super) server: String,
    pub(super) session: Session,
    pub(super) dash: Dashboard,
    pub(super) tab: Origin,
    pub(super) selected: usize,
    pub(super) focus: Focus,
    pub(super) cursor: usize,
    pub(super) status: Option<Status>,
    pub(super) screen: Rect,
    pub(super) quit: bool,

    clock: Box<dyn Clock>,
    ticker: Ticker,
    worker: Worker,
}

impl App {
    pub(super) fn load(store: LocalStore) -> Result<Self> {
        let cfg = store.read_config()?;
        let remote = cfg
            .remote
            .context("no server configured (run `rocketbox login --url ... --email ... --password ...`)")?;
        let rec = store.read_session()?;
        let credentials = rec
            .credentials
            .context("not logged in (run `rocketbox login --url ... --email ... --password ...`)")?;
        let session = match rec.profile {
            Some(profile) => Session::signed_in(profile),
            None => Session::signed_out(),
        };
        let server = remote.base_url.clone();
        let unlocked = store.unlocked_set()?;
        let client = RemoteClient::new(remote, credentials)?.with_store(store.clone());

        let mut app = Self::new(
            Arc::new(client),
            session,
            Dashboard::new(unlocked),
            Box::new(SystemClock),
        );
        app.server = server;
        app.store = Some(store);
        Ok(app)
    }

    pub(super) fn new(
        api: SharedApi,
        session: Session,
        dash: Dashboard,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            store: None,
            server: String::new(),
            session,
            dash,
            tab: Origin::Own,
            selected: 0,
            focus: Focus::List,
            cursor: 0,
            status: None,
            screen: Rect::default(),
            quit: false,
            clock,
            ticker: Ticker::new(Instant::now()),
            worker: Worker::new(api),
        }
    }

    pub(super) fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    pub(super) fn items(&self) -> &[Rocket] {
        self.dash
            .chest(self.tab)
            .map(|book| book.items())
            .unwrap_or_default()
    }

    pub(super) fn selected_rocket(&self) -> Option<&Rocket> {
        self.items().get(self.selected)
    }

    /// The rocket Enter acts on: the list selection, or the grid slot under
    /// the cursor when the grid has focus.
    pub(super) fn focused_rocket(&self) -> Option<&Rocket> {
        match self.focus {
            Focus::List => self.selected_rocket(),
            Focus::Grid => self.dash.grid().slot(self.cursor),
        }
    }

    /// Cached view from the last tick, or a fresh evaluation for items loaded
    /// since and for rockets outside the visible list.
    pub(super) fn lock_view(&self, rocket: &Rocket) -> LockView {
        self.dash
            .lock_view(&rocket.id)
            .filter(|_| rocket.origin == self.tab)
            .cloned()
            .unwrap_or_else(|| lock::evaluate(rocket, self.now()))
    }

    pub(super) fn busy(&self) -> bool {
        self.worker.in_flight() > 0
    }

    pub(super) fn info(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            kind: StatusKind::Info,
            text: text.into(),
            at: self.now(),
        });
    }

    fn error(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            kind: StatusKind::Error,
            text: text.into(),
            at: self.now(),
        });
    }

    /// Shows `err` to the user and signs out when the session is gone.
    fn fail(&mut self, err: CoreError) {
        self.session.observe(&err);
        if err.is_unauthorized()
            && let Some(store) = &self.store
            && let Err(clear) = store.clear_session()
        {
            tracing::warn!(error = %format!("{:#}", clear), "could not clear expired session");
        }
        self.error(err.user_message());
    }

    // ---- navigation ---------------------------------------------------

    pub(super) fn next_tab(&mut self) {
        let tabs = Origin::CHESTS;
        let i = tabs.iter().position(|o| *o == self.tab).unwrap_or(0);
        self.tab = tabs[(i + 1) % tabs.len()];
        self.selected = 0;
        self.tick_now();
    }

    pub(super) fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::List => Focus::Grid,
            Focus::Grid => Focus::List,
        };
    }

    pub(super) fn move_up(&mut self) {
        match self.focus {
            Focus::List => self.selected = self.selected.saturating_sub(1),
            Focus::Grid => self.move_cursor(-(GRID_SLOTS as isize / 2)),
        }
    }

    pub(super) fn move_down(&mut self) {
        match self.focus {
            Focus::List => {
                let max = self.items().len().saturating_sub(1);
                self.selected = (self.selected + 1).min(max);
            }
            Focus::Grid => self.move_cursor(GRID_SLOTS as isize / 2),
        }
    }

    pub(super) fn move_left(&mut self) {
        if self.focus == Focus::Grid {
            self.move_cursor(-1);
        }
    }

    pub(super) fn move_right(&mut self) {
        if self.focus == Focus::Grid {
            self.move_cursor(1);
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let next = self.cursor as isize + delta;
        if (0..GRID_SLOTS as isize).contains(&next) {
            self.cursor = next as usize;
            if self.dash.is_dragging() {
                self.dash.drag_over(self.cursor);
            }
        }
    }

    // ---- remote actions -----------------------------------------------

    pub(super) fn refresh_all(&mut self) {
        for origin in Origin::CHESTS {
            self.refresh_list(origin);
        }
        self.refresh_grid();
    }

    pub(super) fn refresh_list(&mut self, origin: Origin) {
        let token = match self.dash.begin_list(origin) {
            Ok(token) => token,
            Err(err) => return self.fail(err),
        };
        self.start("list", move |api| Done::List {
            origin,
            token,
            result: api.list(origin),
        });
    }

    pub(super) fn refresh_grid(&mut self) {
        let token = self.dash.begin_grid();
        self.start("grid", move |api| Done::Grid {
            token,
            result: api.list(Origin::Display),
        });
    }

    pub(super) fn unlock_selected(&mut self) {
        let Some(rocket) = self.selected_rocket() else {
            return;
        };
        let id = rocket.id.clone();
        let origin = self.tab;
        let rocket_id = match self.dash.check_unlock(origin, &id, self.now()) {
            Ok(rocket_id) => rocket_id,
            Err(err) => return self.fail(err),
        };
        self.info(format!("opening {}...", id));
        self.start("unlock", move |api| Done::Unlock {
            origin,
            result: api.unlock(&rocket_id),
            id,
        });
    }

    pub(super) fn toggle_selected(&mut self) {
        if self.tab != Origin::Received {
            return self.fail(CoreError::Unsupported(self.tab.label()));
        }
        let Some(rocket) = self.selected_rocket() else {
            return;
        };
        let id = rocket.id.clone();
        if let Err(err) = self.dash.check_visibility(&id, self.now()) {
            return self.fail(err);
        }
        self.start("visibility", move |api| Done::Visibility {
            result: api.toggle_visibility(&id),
            id,
        });
    }

    pub(super) fn open_detail(&mut self) {
        let Some(rocket) = self.focused_rocket() else {
            return;
        };
        let id = rocket.id.clone();
        let origin = match self.focus {
            Focus::List => self.tab,
            Focus::Grid => Origin::Display,
        };
        let token = match self.dash.begin_detail(origin, &id) {
            Ok(token) => token,
            Err(err) => return self.fail(err),
        };
        self.start("detail", move |api| Done::Detail {
            origin,
            token,
            result: api.detail(origin, &id),
            id,
        });
    }

    fn start<F>(&mut self, label: &'static str, job: F)
    where
        F: FnOnce(&dyn RocketApi) -> Done + Send + 'static,
    {
        if let Err(err) = self.worker.spawn(label, job) {
            self.error(format!("could not start the {} request: {}", label, err));
        }
    }

    // ---- drag and drop ------------------------------------------------

    pub(super) fn pick_or_drop(&mut self) {
        if self.dash.is_dragging() {
            self.drop_at(self.cursor);
        } else if !self.dash.drag_start(self.cursor) {
            self.error("there is no rocket in that slot");
        }
    }

    pub(super) fn drop_at(&mut self, index: usize) {
        match self.dash.begin_drop(index) {
            Ok(Some(pending)) => {
                let job = pending.clone();
                let spawned = self.worker.spawn("move", move |api| Done::Move {
                    result: job.dispatch(api),
                    pending: job,
                });
                // The optimistic move must still settle, or every later move
                // would be refused.
                if let Err(err) = spawned {
                    self.apply(Done::Move {
                        pending,
                        result: Err(RemoteError::transport("move", err)),
                    });
                }
            }
            Ok(None) => {}
            Err(err) => self.fail(err),
        }
    }

    pub(super) fn cancel_drag(&mut self) {
        self.dash.drag_end();
    }

    // ---- results ------------------------------------------------------

    /// Applies every finished remote call. Returns true if anything arrived.
    pub(super) fn pump(&mut self) -> bool {
        let done = self.worker.drain();
        let any = !done.is_empty();
        for d in done {
            self.apply(d);
        }
        any
    }

    /// Waits up to `timeout` for one remote call to finish and applies it.
    #[cfg(test)]
    pub(super) fn pump_one(&mut self, timeout: Duration) -> bool {
        match self.worker.wait(timeout) {
            Some(done) => {
                self.apply(done);
                true
            }
            None => false,
        }
    }

    fn apply(&mut self, done: Done) {
        let now = self.now();
        match done {
            Done::List {
                origin,
                token,
                result,
            } => match self.dash.finish_list(origin, token, result) {
                Ok(ListLoad::Applied { .. }) => {
                    if origin == self.tab {
                        let max = self.items().len().saturating_sub(1);
                        self.selected = self.selected.min(max);
                        self.tick_now();
                    }
                }
                Ok(ListLoad::Stale) => {}
                Err(err) => self.fail(err),
            },
            Done::Grid { token, result } => {
                if let Err(err) = self.dash.finish_grid(token, result, now) {
                    self.fail(err);
                }
            }
            Done::Unlock { origin, id, result } => match result {
                Ok(()) => {
                    // A failed save still leaves the rocket open on screen.
                    let saved = self.dash.apply_unlock(origin, &id, now);
                    self.tick_now();
                    match saved {
                        Ok(()) => self.info(format!("opened {}", id)),
                        Err(err) => self.fail(err),
                    }
                }
                Err(err) => self.fail(err.into()),
            },
            Done::Visibility { id, result } => match result {
                Ok(is_public) => {
                    if let Err(err) = self.dash.apply_visibility(&id, is_public) {
                        return self.fail(err);
                    }
                    self.info(if is_public {
                        format!("{} is on display", id)
                    } else {
                        format!("{} is no longer on display", id)
                    });
                    self.refresh_grid();
                }
                Err(err) => self.fail(err.into()),
            },
            Done::Detail {
                origin,
                id,
                token,
                result,
            } => {
                if let Err(err) = self.dash.finish_detail(origin, &id, token, result) {
                    self.fail(err);
                }
            }
            Done::Move { pending, result } => {
                match self.dash.settle_move(&pending, &result) {
                    Settle::Committed => self.info("display rearranged"),
                    Settle::RolledBack => {}
                    Settle::Stale => self.refresh_grid(),
                }
                if let Err(err) = result {
                    self.fail(err.into());
                }
            }
        }
    }

    // ---- clock --------------------------------------------------------

    /// Drives the shared one-second tick.
    pub(super) fn poll_tick(&mut self, instant: Instant) -> Option<Tick> {
        let tick = self.ticker.poll(instant, self.clock.as_ref())?;
        let transitions = self.dash.tick(self.tab, tick.at);
        self.announce(&transitions);
        Some(tick)
    }

    pub(super) fn until_next_tick(&self, instant: Instant) -> Duration {
        self.ticker.until_next(instant)
    }

    fn tick_now(&mut self) {
        let now = self.now();
        let transitions = self.dash.tick(self.tab, now);
        self.announce(&transitions);
    }

    fn announce(&mut self, transitions: &[Transition]) {
        for t in transitions {
            let name = self
                .dash
                .chest(self.tab)
                .ok()
                .and_then(|book| book.get(&t.id))
                .map(|r| r.name.clone())
                .unwrap_or_else(|| t.id.to_string());
            match (t.from, t.to) {
                (LockState::Locked, LockState::Unlockable) => {
                    self.info(format!("{} is ready to open", name))
                }
                (LockState::Locked, LockState::Unlocked) => {
                    self.info(format!("{} opened on schedule", name))
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/tui_shell/app_tests.rs"]
mod tests;

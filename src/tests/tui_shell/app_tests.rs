use super::*;

use crossterm::event::KeyModifiers;

use crate::clock::ManualClock;
use crate::model::Profile;
use crate::store::UnlockedSet;
use crate::test_support::{FakeApi, at, displayed, rejected, rocket, t0};
use crate::tui_shell::event_loop::{handle_key, handle_mouse};
use crate::tui_shell::layout;

fn app_with(api: &Arc<FakeApi>, clock: &Arc<ManualClock>) -> App {
    let profile = Profile {
        user_id: "u1".to_string(),
        nickname: "tester".to_string(),
        email: "tester@example.com".to_string(),
    };
    App::new(
        api.clone(),
        Session::signed_in(profile),
        Dashboard::new(UnlockedSet::in_memory()),
        Box::new(Arc::clone(clock)),
    )
}

fn settle(app: &mut App) {
    while app.busy() {
        assert!(
            app.pump_one(Duration::from_secs(5)),
            "remote call did not finish"
        );
    }
}

fn press(app: &mut App, code: KeyCode) {
    handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
}

fn status_text(app: &App) -> Option<(StatusKind, &str)> {
    app.status.as_ref().map(|s| (s.kind, s.text.as_str()))
}

#[test]
fn refresh_fills_every_list_and_the_grid() {
    let api = Arc::new(
        FakeApi::new()
            .with_list(Origin::Own, vec![rocket("o1", Origin::Own)])
            .with_list(Origin::Group, vec![rocket("g1", Origin::Group)])
            .with_list(Origin::Display, vec![displayed("d1", Some(3))]),
    );
    let clock = Arc::new(ManualClock::new(t0()));
    let mut app = app_with(&api, &clock);

    app.refresh_all();
    assert!(app.busy());
    settle(&mut app);

    assert_eq!(api.calls().list, 5);
    assert_eq!(app.items().len(), 1);
    assert_eq!(app.dash.grid().position(&ItemId::from("d1")), Some(3));

    press(&mut app, KeyCode::Tab);
    assert_eq!(app.tab, Origin::Received);
    assert!(app.items().is_empty());
}

#[test]
fn unlock_key_respects_the_lock() {
    let api = Arc::new(FakeApi::new().with_list(
        Origin::Received,
        vec![rocket("c1", Origin::Received).locked_until(at(5))],
    ));
    let clock = Arc::new(ManualClock::new(t0()));
    let mut app = app_with(&api, &clock);
    app.tab = Origin::Received;
    app.refresh_list(Origin::Received);
    settle(&mut app);

    press(&mut app, KeyCode::Char('u'));
    assert_eq!(
        status_text(&app),
        Some((StatusKind::Error, "this rocket is still locked"))
    );
    assert!(!app.busy());
    assert_eq!(api.calls().unlock, 0);

    clock.set(at(10));
    press(&mut app, KeyCode::Char('u'));
    assert_eq!(status_text(&app), Some((StatusKind::Info, "opening c1...")));
    settle(&mut app);

    assert_eq!(status_text(&app), Some((StatusKind::Info, "opened c1")));
    assert_eq!(api.calls().unlock, 1);
    let view = app.lock_view(app.selected_rocket().expect("selected"));
    assert_eq!(view.state, LockState::Unlocked);
}

#[test]
fn rejected_unlock_shows_the_server_reason() {
    let api = Arc::new(FakeApi::new().with_list(
        Origin::Received,
        vec![rocket("c1", Origin::Received).locked_until(at(-5))],
    ));
    api.fail("unlock", rejected("rocket is still locked"));
    let clock = Arc::new(ManualClock::new(t0()));
    let mut app = app_with(&api, &clock);
    app.tab = Origin::Received;
    app.refresh_list(Origin::Received);
    settle(&mut app);

    press(&mut app, KeyCode::Char('u'));
    settle(&mut app);
    assert_eq!(
        status_text(&app),
        Some((StatusKind::Error, "rocket is still locked"))
    );
    assert!(app.selected_rocket().is_some_and(|r| r.is_locked));
}

#[test]
fn visibility_is_only_offered_on_received() {
    let api = Arc::new(FakeApi::new().with_list(Origin::Own, vec![rocket("o1", Origin::Own)]));
    let clock = Arc::new(ManualClock::new(t0()));
    let mut app = app_with(&api, &clock);
    app.refresh_list(Origin::Own);
    settle(&mut app);

    press(&mut app, KeyCode::Char('v'));
    assert_eq!(
        status_text(&app),
        Some((StatusKind::Error, "own does not support this"))
    );
    assert_eq!(api.calls().toggle, 0);
}

#[test]
fn visibility_toggle_reloads_the_grid() {
    let api = Arc::new(
        FakeApi::new().with_list(Origin::Received, vec![rocket("c1", Origin::Received)]),
    );
    let clock = Arc::new(ManualClock::new(t0()));
    let mut app = app_with(&api, &clock);
    app.tab = Origin::Received;
    app.refresh_all();
    settle(&mut app);

    api.set_list(Origin::Display, vec![displayed("c1", None)]);
    press(&mut app, KeyCode::Char('v'));
    settle(&mut app);

    assert_eq!(api.calls().toggle, 1);
    assert_eq!(app.dash.grid().position(&ItemId::from("c1")), Some(0));
    assert_eq!(
        status_text(&app),
        Some((StatusKind::Info, "c1 is on display"))
    );
}

#[test]
fn keyboard_pick_and_drop_moves_a_rocket() {
    let api = Arc::new(FakeApi::new().with_list(
        Origin::Display,
        vec![displayed("a", Some(0)), displayed("b", Some(2))],
    ));
    let clock = Arc::new(ManualClock::new(t0()));
    let mut app = app_with(&api, &clock);
    app.refresh_grid();
    settle(&mut app);

    press(&mut app, KeyCode::Char('g'));
    assert_eq!(app.focus, Focus::Grid);
    press(&mut app, KeyCode::Char(' '));
    assert!(app.dash.is_dragging());
    press(&mut app, KeyCode::Right);
    assert_eq!(app.dash.drag_target(), Some(1));
    press(&mut app, KeyCode::Char(' '));
    assert!(!app.dash.is_dragging());
    // Applied optimistically before the server answers.
    assert_eq!(app.dash.grid().position(&ItemId::from("a")), Some(1));
    settle(&mut app);

    assert_eq!(api.calls().move_to_empty, 1);
    assert_eq!(
        status_text(&app),
        Some((StatusKind::Info, "display rearranged"))
    );
}

#[test]
fn rejected_drop_rolls_back() {
    let api = Arc::new(FakeApi::new().with_list(
        Origin::Display,
        vec![displayed("a", Some(0)), displayed("b", Some(5))],
    ));
    api.fail("swap", rejected("slot is locked"));
    let clock = Arc::new(ManualClock::new(t0()));
    let mut app = app_with(&api, &clock);
    app.refresh_grid();
    settle(&mut app);

    press(&mut app, KeyCode::Char('g'));
    press(&mut app, KeyCode::Char(' '));
    press(&mut app, KeyCode::Down);
    assert_eq!(app.cursor, 5);
    press(&mut app, KeyCode::Char(' '));
    settle(&mut app);

    assert_eq!(app.dash.grid().position(&ItemId::from("a")), Some(0));
    assert_eq!(app.dash.grid().position(&ItemId::from("b")), Some(5));
    assert_eq!(
        status_text(&app),
        Some((StatusKind::Error, "slot is locked"))
    );
}

#[test]
fn picking_an_empty_slot_is_an_error_and_esc_cancels() {
    let api = Arc::new(FakeApi::new().with_list(Origin::Display, vec![displayed("a", Some(0))]));
    let clock = Arc::new(ManualClock::new(t0()));
    let mut app = app_with(&api, &clock);
    app.refresh_grid();
    settle(&mut app);

    press(&mut app, KeyCode::Char('g'));
    press(&mut app, KeyCode::Right);
    press(&mut app, KeyCode::Char(' '));
    assert_eq!(
        status_text(&app),
        Some((StatusKind::Error, "there is no rocket in that slot"))
    );

    press(&mut app, KeyCode::Left);
    press(&mut app, KeyCode::Char(' '));
    assert!(app.dash.is_dragging());
    press(&mut app, KeyCode::Esc);
    assert!(!app.dash.is_dragging());
    assert_eq!(app.focus, Focus::Grid);
    press(&mut app, KeyCode::Esc);
    assert_eq!(app.focus, Focus::List);
    assert_eq!(api.calls().swap + api.calls().move_to_empty, 0);
}

#[test]
fn mouse_drag_between_slots() {
    let api = Arc::new(FakeApi::new().with_list(
        Origin::Display,
        vec![displayed("a", Some(0)), displayed("b", Some(7))],
    ));
    let clock = Arc::new(ManualClock::new(t0()));
    let mut app = app_with(&api, &clock);
    app.refresh_grid();
    settle(&mut app);
    app.screen = Rect::new(0, 0, 120, 40);

    let cells = layout::grid_cells(layout::panes(app.screen).grid);
    let mouse = |kind, cell: Rect| MouseEvent {
        kind,
        column: cell.x + cell.width / 2,
        row: cell.y + cell.height / 2,
        modifiers: KeyModifiers::NONE,
    };

    handle_mouse(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), cells[0]));
    assert!(app.dash.is_dragging());
    handle_mouse(&mut app, mouse(MouseEventKind::Drag(MouseButton::Left), cells[7]));
    assert_eq!(app.dash.drag_target(), Some(7));
    handle_mouse(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), cells[7]));
    settle(&mut app);

    assert_eq!(api.calls().swap, 1);
    assert_eq!(app.dash.grid().position(&ItemId::from("a")), Some(7));
    assert_eq!(app.dash.grid().position(&ItemId::from("b")), Some(0));
}

#[test]
fn tick_announces_rockets_becoming_ready() {
    let api = Arc::new(FakeApi::new().with_list(
        Origin::Received,
        vec![rocket("c1", Origin::Received).locked_until(at(2))],
    ));
    let clock = Arc::new(ManualClock::new(t0()));
    let mut app = app_with(&api, &clock);
    app.tab = Origin::Received;
    app.refresh_list(Origin::Received);
    settle(&mut app);
    assert!(app.status.is_none());

    clock.set(at(2));
    assert!(app.poll_tick(Instant::now()).is_some());
    assert_eq!(
        status_text(&app),
        Some((StatusKind::Info, "rocket c1 is ready to open"))
    );
}

#[test]
fn expired_session_signs_out() {
    let api = Arc::new(FakeApi::new());
    api.fail("list", RemoteError::Unauthorized);
    let clock = Arc::new(ManualClock::new(t0()));
    let mut app = app_with(&api, &clock);
    assert!(app.session.is_authenticated());

    app.refresh_list(Origin::Own);
    settle(&mut app);
    assert!(!app.session.is_authenticated());
    assert_eq!(
        status_text(&app),
        Some((StatusKind::Error, "your session expired, please log in again"))
    );
}

#[test]
fn detail_key_loads_content() {
    let api = Arc::new(
        FakeApi::new()
            .with_list(Origin::Own, vec![rocket("o1", Origin::Own)])
            .with_detail(
                "o1",
                crate::model::RocketDetail {
                    content: Some("hello".to_string()),
                    attachments: Vec::new(),
                },
            ),
    );
    let clock = Arc::new(ManualClock::new(t0()));
    let mut app = app_with(&api, &clock);
    app.refresh_list(Origin::Own);
    settle(&mut app);

    press(&mut app, KeyCode::Enter);
    assert_eq!(
        app.selected_rocket().map(|r| r.detail),
        Some(DetailState::Loading)
    );
    settle(&mut app);
    let r = app.selected_rocket().expect("selected");
    assert_eq!(r.detail, DetailState::Loaded);
    assert_eq!(r.content.as_deref(), Some("hello"));
}

#[test]
fn quit_key_stops_the_loop() {
    let api = Arc::new(FakeApi::new());
    let clock = Arc::new(ManualClock::new(t0()));
    let mut app = app_with(&api, &clock);
    press(&mut app, KeyCode::Char('q'));
    assert!(app.quit);
}

#[test]
fn detail_key_on_the_grid_loads_the_slot_under_the_cursor() {
    let api = Arc::new(
        FakeApi::new()
            .with_list(Origin::Own, vec![rocket("o1", Origin::Own)])
            .with_list(
                Origin::Display,
                vec![displayed("d1", Some(0)), displayed("d2", Some(1))],
            )
            .with_detail(
                "d2",
                crate::model::RocketDetail {
                    content: Some("framed".to_string()),
                    attachments: Vec::new(),
                },
            ),
    );
    let clock = Arc::new(ManualClock::new(t0()));
    let mut app = app_with(&api, &clock);
    app.refresh_all();
    settle(&mut app);

    press(&mut app, KeyCode::Char('g'));
    press(&mut app, KeyCode::Right);
    assert_eq!(app.focused_rocket().map(|r| r.id.as_str()), Some("d2"));
    press(&mut app, KeyCode::Enter);
    settle(&mut app);

    let d2 = app.dash.grid().slot(1).expect("d2 on display");
    assert_eq!(d2.detail, DetailState::Loaded);
    assert_eq!(d2.content.as_deref(), Some("framed"));
    assert_eq!(app.dash.grid().slot(0).map(|r| r.detail), Some(DetailState::NotLoaded));
    assert_eq!(app.selected_rocket().map(|r| r.detail), Some(DetailState::NotLoaded));
    assert_eq!(api.calls().detail, 1);

    press(&mut app, KeyCode::Char('g'));
    assert_eq!(app.focused_rocket().map(|r| r.id.as_str()), Some("o1"));
}

#[test]
fn move_that_cannot_start_rolls_back_and_frees_the_grid() {
    let api = Arc::new(FakeApi::new().with_list(
        Origin::Display,
        vec![displayed("a", Some(0)), displayed("b", Some(2))],
    ));
    let clock = Arc::new(ManualClock::new(t0()));
    let mut app = app_with(&api, &clock);
    app.refresh_grid();
    settle(&mut app);

    app.worker.refuse_threads = true;
    press(&mut app, KeyCode::Char('g'));
    press(&mut app, KeyCode::Char(' '));
    press(&mut app, KeyCode::Right);
    press(&mut app, KeyCode::Char(' '));

    assert!(!app.busy());
    assert!(!app.dash.grid().has_pending_move());
    assert_eq!(app.dash.grid().position(&ItemId::from("a")), Some(0));
    assert_eq!(
        status_text(&app),
        Some((StatusKind::Error, "could not reach the server, try again"))
    );
    assert_eq!(api.calls().move_to_empty, 0);

    // The next move goes through once threads are available again.
    app.worker.refuse_threads = false;
    press(&mut app, KeyCode::Right);
    press(&mut app, KeyCode::Char(' '));
    press(&mut app, KeyCode::Left);
    press(&mut app, KeyCode::Char(' '));
    settle(&mut app);
    assert_eq!(app.dash.grid().position(&ItemId::from("b")), Some(1));
    assert_eq!(api.calls().move_to_empty, 1);
}

use super::*;

use crate::test_support::{FakeApi, at, displayed, rejected, rocket, t0};

fn grid_of(items: Vec<Rocket>) -> DisplayGrid {
    let mut grid = DisplayGrid::new();
    grid.apply_load(items, t0());
    grid
}

fn ids(grid: &DisplayGrid) -> Vec<Option<&str>> {
    grid.slots()
        .iter()
        .map(|s| s.as_ref().map(|r| r.id.as_str()))
        .collect()
}

fn layout(cells: &[Option<&'static str>]) -> Vec<Option<&'static str>> {
    let mut out = cells.to_vec();
    out.resize(GRID_SLOTS, None);
    out
}

#[test]
fn new_grid_is_empty_with_ten_slots() {
    let grid = DisplayGrid::new();
    assert_eq!(grid.slots().len(), GRID_SLOTS);
    assert_eq!(grid.occupied(), 0);
    assert!(grid.is_consistent());
}

#[test]
fn move_to_empty_slot() {
    let api = FakeApi::new();
    let mut grid = grid_of(vec![displayed("r1", Some(0)), displayed("r2", Some(2))]);

    let settle = grid.move_to_empty(&api, 0, 1).expect("move");
    assert_eq!(settle, Settle::Committed);
    assert_eq!(ids(&grid), layout(&[None, Some("r1"), Some("r2")]));
    assert_eq!(grid.slot(1).and_then(|r| r.display_location), Some(1));
    assert_eq!(api.calls().move_to_empty, 1);
    assert!(grid.is_consistent());
}

#[test]
fn swap_two_occupied_slots() {
    let api = FakeApi::new();
    let mut grid = grid_of(vec![displayed("r1", Some(0)), displayed("r2", Some(2))]);

    grid.swap(&api, 0, 2).expect("swap");
    assert_eq!(ids(&grid), layout(&[Some("r2"), None, Some("r1")]));
    assert_eq!(grid.position(&ItemId::from("r1")), Some(2));
    assert_eq!(api.calls().swap, 1);
    assert!(grid.is_consistent());
}

#[test]
fn swapping_twice_restores_the_arrangement() {
    let api = FakeApi::new();
    let mut grid = grid_of(vec![
        displayed("r1", Some(0)),
        displayed("r2", Some(4)),
        displayed("r3", Some(7)),
    ]);
    let before = grid.slots().to_vec();
    grid.swap(&api, 4, 7).expect("first");
    grid.swap(&api, 4, 7).expect("second");
    assert_eq!(grid.slots(), before.as_slice());
}

#[test]
fn drop_on_same_slot_changes_nothing() {
    let mut grid = grid_of(vec![displayed("r1", Some(3))]);
    let before = grid.slots().to_vec();
    grid.drop_same_slot(3);
    grid.drop_same_slot(3);
    assert_eq!(grid.slots(), before.as_slice());

    let api = FakeApi::new();
    let err = grid.swap(&api, 3, 3).expect_err("same slot");
    assert!(matches!(err, CoreError::SameSlot(3)));
    assert_eq!(api.calls().total(), 0);
}

#[test]
fn rejected_swap_rolls_back_exactly() {
    let api = FakeApi::new();
    api.fail("swap", rejected("not yours"));
    let mut grid = grid_of(vec![displayed("r1", Some(0)), displayed("r2", Some(1))]);
    let before = grid.slots().to_vec();

    let err = grid.swap(&api, 0, 1).expect_err("rejected");
    assert!(matches!(err, CoreError::Remote(RemoteError::Rejected { .. })));
    assert_eq!(grid.slots(), before.as_slice());
    assert!(!grid.has_pending_move());
    assert!(grid.is_consistent());
}

#[test]
fn rejected_move_rolls_back_and_grid_stays_usable() {
    let api = FakeApi::new();
    api.fail("move", RemoteError::transport("move", "connection refused"));
    let mut grid = grid_of(vec![displayed("r1", Some(0))]);
    let before = grid.slots().to_vec();

    grid.move_to_empty(&api, 0, 5).expect_err("transport");
    assert_eq!(grid.slots(), before.as_slice());

    api.heal("move");
    grid.move_to_empty(&api, 0, 5).expect("retry by hand");
    assert_eq!(grid.position(&ItemId::from("r1")), Some(5));
}

#[test]
fn optimistic_state_is_visible_before_settle() {
    let mut grid = grid_of(vec![displayed("r1", Some(0))]);
    let pending = grid
        .begin(GridMove::MoveToEmpty {
            source: 0,
            target: 9,
        })
        .expect("begin");
    assert!(grid.has_pending_move());
    assert_eq!(grid.position(&ItemId::from("r1")), Some(9));

    let err = grid
        .begin(GridMove::MoveToEmpty {
            source: 9,
            target: 0,
        })
        .expect_err("second move");
    assert!(matches!(err, CoreError::MoveInFlight));

    assert_eq!(grid.settle(&pending, &Err(rejected("no"))), Settle::RolledBack);
    assert_eq!(grid.position(&ItemId::from("r1")), Some(0));
}

#[test]
fn reload_during_pending_move_makes_settle_stale() {
    let mut grid = grid_of(vec![displayed("r1", Some(0)), displayed("r2", Some(1))]);
    let pending = grid
        .begin(GridMove::Swap {
            source: 0,
            target: 1,
        })
        .expect("begin");

    grid.apply_load(
        vec![displayed("r1", Some(6)), displayed("r2", Some(7))],
        t0(),
    );
    assert!(!grid.has_pending_move());

    assert_eq!(grid.settle(&pending, &Ok(())), Settle::Stale);
    assert_eq!(grid.position(&ItemId::from("r1")), Some(6));

    // A late rejection must not roll back over the reload either.
    assert_eq!(grid.settle(&pending, &Err(rejected("no"))), Settle::Stale);
    assert_eq!(grid.position(&ItemId::from("r2")), Some(7));
}

#[test]
fn validation_errors_in_check_order() {
    let mut grid = grid_of(vec![displayed("r1", Some(0)), displayed("r2", Some(1))]);
    let swap = |source, target| GridMove::Swap { source, target };
    let mv = |source, target| GridMove::MoveToEmpty { source, target };

    assert!(matches!(grid.begin(swap(0, 10)), Err(CoreError::SlotOutOfRange(10))));
    assert!(matches!(grid.begin(swap(12, 12)), Err(CoreError::SlotOutOfRange(12))));
    assert!(matches!(grid.begin(swap(4, 0)), Err(CoreError::SlotEmpty(4))));
    assert!(matches!(grid.begin(swap(0, 4)), Err(CoreError::SlotEmpty(4))));
    assert!(matches!(grid.begin(mv(0, 1)), Err(CoreError::SlotOccupied(1))));
    assert!(!grid.has_pending_move());
    assert!(grid.is_consistent());
}

#[test]
fn load_keeps_valid_slots_and_fills_first_empty() {
    let mut grid = DisplayGrid::new();
    let outcome = grid.apply_load(
        vec![
            displayed("a", Some(2)),
            displayed("b", None),
            displayed("c", Some(2)),
            displayed("d", Some(0)),
        ],
        t0(),
    );
    assert_eq!(
        outcome,
        GridLoad::Applied {
            placed: 4,
            dropped: 0
        }
    );
    assert_eq!(
        ids(&grid),
        layout(&[Some("d"), Some("b"), Some("a"), Some("c")])
    );
    assert!(grid.slots().iter().flatten().all(|r| r.is_public));
    assert!(grid.is_consistent());
}

#[test]
fn load_drops_duplicates_locked_and_overflow() {
    let mut items: Vec<Rocket> = (0..GRID_SLOTS)
        .map(|i| displayed(&format!("r{}", i), Some(i)))
        .collect();
    items.push(displayed("r3", None));
    items.push(rocket("locked", Origin::Display).locked_until(at(60)));
    items.push(displayed("extra", None));

    let mut grid = DisplayGrid::new();
    let outcome = grid.apply_load(items, t0());
    assert_eq!(
        outcome,
        GridLoad::Applied {
            placed: GRID_SLOTS,
            dropped: 3
        }
    );
    assert!(grid.position(&ItemId::from("extra")).is_none());
    assert!(grid.position(&ItemId::from("locked")).is_none());
    assert!(grid.is_consistent());
}

#[test]
fn stale_list_response_is_dropped() {
    let mut grid = grid_of(vec![displayed("keep", Some(0))]);
    let old = grid.begin_load();
    let new = grid.begin_load();
    assert!(grid.is_loading());

    let fresh = grid
        .finish_load(new, Ok(vec![displayed("fresh", Some(1))]), t0())
        .expect("fresh");
    assert!(matches!(fresh, GridLoad::Applied { placed: 1, .. }));

    let late = grid
        .finish_load(old, Ok(vec![displayed("late", Some(0))]), t0())
        .expect("late");
    assert_eq!(late, GridLoad::Stale);
    assert_eq!(ids(&grid), layout(&[None, Some("fresh")]));
}

#[test]
fn failed_load_keeps_the_previous_arrangement() {
    let api = FakeApi::new();
    api.fail("list", RemoteError::transport("list", "timeout"));
    let mut grid = grid_of(vec![displayed("r1", Some(4))]);
    grid.load(&api, t0()).expect_err("list fails");
    assert_eq!(grid.position(&ItemId::from("r1")), Some(4));
}

#[test]
fn load_reads_display_list_from_api() {
    let api = FakeApi::new().with_list(
        Origin::Display,
        vec![displayed("x", Some(8)), displayed("y", Some(8))],
    );
    let mut grid = DisplayGrid::new();
    grid.load(&api, t0()).expect("load");
    assert_eq!(grid.position(&ItemId::from("x")), Some(8));
    assert_eq!(grid.position(&ItemId::from("y")), Some(0));
}

#[test]
fn stays_consistent_through_a_sequence_of_moves() {
    let api = FakeApi::new();
    let mut grid = grid_of(vec![
        displayed("a", Some(0)),
        displayed("b", Some(1)),
        displayed("c", Some(5)),
    ]);
    grid.swap(&api, 0, 1).expect("swap");
    grid.move_to_empty(&api, 5, 9).expect("move");
    api.fail("swap", rejected("no"));
    grid.swap(&api, 9, 0).expect_err("rejected");
    grid.move_to_empty(&api, 1, 2).expect("move");
    assert!(grid.is_consistent());
    assert_eq!(grid.occupied(), 3);
    assert_eq!(ids(&grid), layout(&[Some("b"), None, Some("a"), None, None, None, None, None, None, Some("c")]));
}

fn letter() -> RocketDetail {
    RocketDetail {
        content: Some("greetings from the past".to_string()),
        attachments: Vec::new(),
    }
}

#[test]
fn displayed_rocket_detail_loads_in_place() {
    let api = FakeApi::new().with_detail("r1", letter());
    let mut grid = grid_of(vec![displayed("r1", Some(0)), displayed("r2", Some(1))]);

    let outcome = grid.load_detail(&api, &ItemId::from("r1")).expect("detail");
    assert_eq!(outcome, DetailOutcome::Loaded);
    assert_eq!(api.calls().detail, 1);
    let r = grid.slot(0).expect("still in slot 0");
    assert_eq!(r.detail, DetailState::Loaded);
    assert_eq!(r.content.as_deref(), Some("greetings from the past"));
    assert_eq!(grid.slot(1).map(|r| r.detail), Some(DetailState::NotLoaded));
}

#[test]
fn failed_display_detail_keeps_the_summary() {
    let api = FakeApi::new();
    api.fail("detail", rejected("gone"));
    let mut grid = grid_of(vec![displayed("r1", Some(0))]);

    let err = grid
        .load_detail(&api, &ItemId::from("r1"))
        .expect_err("detail fails");
    assert_eq!(err.user_message(), "gone");
    let r = grid.slot(0).expect("summary still there");
    assert_eq!(r.detail, DetailState::Failed);
    assert_eq!(r.name, "rocket r1");
    assert!(grid.is_consistent());
}

#[test]
fn superseded_display_detail_is_dropped() {
    let mut grid = grid_of(vec![displayed("r1", Some(0))]);
    let first = grid.begin_detail(&ItemId::from("r1")).expect("first");
    let second = grid.begin_detail(&ItemId::from("r1")).expect("second");

    let late = grid
        .finish_detail(&ItemId::from("r1"), first, Err(rejected("slow")))
        .expect("stale is not an error");
    assert_eq!(late, DetailOutcome::Stale);
    assert_eq!(grid.slot(0).map(|r| r.detail), Some(DetailState::Loading));

    grid.finish_detail(&ItemId::from("r1"), second, Ok(letter()))
        .expect("current");
    assert_eq!(grid.slot(0).map(|r| r.detail), Some(DetailState::Loaded));
}

#[test]
fn empty_grid_has_no_detail_to_load() {
    let api = FakeApi::new();
    let mut grid = DisplayGrid::new();
    let err = grid
        .load_detail(&api, &ItemId::from("ghost"))
        .expect_err("unknown");
    assert!(matches!(err, CoreError::UnknownItem(_)));
    assert_eq!(api.calls().detail, 0);
}

#[test]
fn detail_follows_the_rocket_through_moves_and_reloads() {
    let api = FakeApi::new().with_detail("r1", letter());
    let mut grid = grid_of(vec![displayed("r1", Some(0)), displayed("r2", Some(2))]);
    grid.load_detail(&api, &ItemId::from("r1")).expect("detail");

    grid.swap(&api, 0, 2).expect("swap");
    assert_eq!(grid.slot(2).map(|r| r.detail), Some(DetailState::Loaded));

    // Detail fetched while a move is pending survives the rollback.
    api.fail("move", rejected("no"));
    let pending = grid
        .begin(GridMove::MoveToEmpty {
            source: 0,
            target: 5,
        })
        .expect("begin");
    grid.load_detail(&api, &ItemId::from("r2")).expect("detail r2");
    let result = pending.dispatch(&api);
    assert_eq!(grid.settle(&pending, &result), Settle::RolledBack);
    assert_eq!(grid.slot(0).map(|r| r.detail), Some(DetailState::Loaded));

    grid.apply_load(
        vec![displayed("r1", Some(4)), displayed("r2", Some(0))],
        t0(),
    );
    let r1 = grid.slot(4).expect("r1 reloaded");
    assert_eq!(r1.content.as_deref(), Some("greetings from the past"));
    assert_eq!(r1.detail, DetailState::Loaded);
}

#[test]
fn detail_response_after_a_reload_still_lands() {
    let mut grid = grid_of(vec![displayed("r1", Some(0))]);
    let token = grid.begin_detail(&ItemId::from("r1")).expect("begin");

    grid.apply_load(vec![displayed("r1", Some(3))], t0());
    assert_eq!(grid.slot(3).map(|r| r.detail), Some(DetailState::Loading));

    let outcome = grid
        .finish_detail(&ItemId::from("r1"), token, Ok(letter()))
        .expect("merge");
    assert_eq!(outcome, DetailOutcome::Loaded);
    assert_eq!(grid.slot(3).map(|r| r.detail), Some(DetailState::Loaded));

    // A rocket that left the display drops its pending fetch.
    let token = grid.begin_detail(&ItemId::from("r1")).expect("begin again");
    grid.apply_load(Vec::new(), t0());
    let outcome = grid
        .finish_detail(&ItemId::from("r1"), token, Ok(letter()))
        .expect("dropped");
    assert_eq!(outcome, DetailOutcome::Stale);
}

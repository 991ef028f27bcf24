use rocketbox::clock::{Clock, SystemClock};
use rocketbox::display::{GRID_SLOTS, GridMove};

use super::*;

#[derive(Serialize)]
struct SlotRow {
    /// 1-based.
    slot: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    rocket: Option<RocketRow>,
}

pub(super) fn handle_grid_command(store: &LocalStore, json: bool) -> Result<()> {
    let mut ctx = CommandCtx::open(store)?;
    let now = SystemClock.now();
    if let Err(err) = ctx.dash.refresh_grid(&ctx.client, now) {
        return Err(ctx.fail(err));
    }
    print_grid(&ctx, json)
}

pub(super) fn handle_swap_command(store: &LocalStore, from: usize, to: usize) -> Result<()> {
    run_move(store, GridMove::Swap {
        source: from,
        target: to,
    })
}

pub(super) fn handle_move_command(store: &LocalStore, from: usize, to: usize) -> Result<()> {
    run_move(store, GridMove::MoveToEmpty {
        source: from,
        target: to,
    })
}

fn run_move(store: &LocalStore, mv: GridMove) -> Result<()> {
    let mut ctx = CommandCtx::open(store)?;
    let now = SystemClock.now();
    if let Err(err) = ctx.dash.refresh_grid(&ctx.client, now) {
        return Err(ctx.fail(err));
    }
    if let Err(err) = ctx.dash.run_move(&ctx.client, mv, now) {
        return Err(ctx.fail(err));
    }
    print_grid(&ctx, false)
}

fn print_grid(ctx: &CommandCtx, json: bool) -> Result<()> {
    let now = SystemClock.now();
    let grid = ctx.dash.grid();
    if json {
        let rows: Vec<SlotRow> = grid
            .slots()
            .iter()
            .enumerate()
            .map(|(i, slot)| SlotRow {
                slot: i + 1,
                rocket: slot.as_ref().map(|r| RocketRow::new(r, now)),
            })
            .collect();
        return print_json(&rows, "display grid");
    }
    for i in 0..GRID_SLOTS {
        match grid.slot(i) {
            Some(rocket) => {
                let from = rocket
                    .sender
                    .as_deref()
                    .map(|s| format!(" from {}", s))
                    .unwrap_or_default();
                println!("{:>2}  {} {}{}", i + 1, rocket.id, rocket.name, from);
            }
            None => println!("{:>2}  -", i + 1),
        }
    }
    Ok(())
}

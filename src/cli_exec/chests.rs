use std::path::PathBuf;

use rocketbox::clock::{Clock, SystemClock};
use rocketbox::remote::RocketApi;

use super::*;

pub(super) fn handle_list_command(store: &LocalStore, origin: Origin, json: bool) -> Result<()> {
    let mut ctx = CommandCtx::open(store)?;
    if let Err(err) = ctx.dash.refresh_list(&ctx.client, origin) {
        return Err(ctx.fail(err));
    }
    let now = SystemClock.now();
    let book = ctx.dash.chest(origin).map_err(ctx_err)?;
    let rows: Vec<RocketRow> = book.items().iter().map(|r| RocketRow::new(r, now)).collect();

    if json {
        print_json(&rows, "rocket list")?;
        return Ok(());
    }
    if rows.is_empty() {
        println!("No {}", chest_label(origin));
        return Ok(());
    }
    for row in rows {
        let who = match origin {
            Origin::Sent => row.receiver.map(|r| format!(" to {}", r)),
            _ => row.sender.map(|s| format!(" from {}", s)),
        }
        .unwrap_or_default();
        let shown = if row.display_location.is_some() {
            " [on display]"
        } else {
            ""
        };
        println!(
            "{} {} ({}){}{}  {}",
            row.id, row.name, row.countdown, who, shown, row.state
        );
    }
    Ok(())
}

pub(super) fn handle_show_command(store: &LocalStore, origin: Origin, id: &ItemId) -> Result<()> {
    let mut ctx = CommandCtx::open(store)?;
    let now = SystemClock.now();
    let loaded = match origin {
        Origin::Display => ctx.dash.refresh_grid(&ctx.client, now).map(|_| ()),
        _ => ctx.dash.refresh_list(&ctx.client, origin).map(|_| ()),
    };
    if let Err(err) = loaded {
        return Err(ctx.fail(err));
    }
    // A failed detail fetch still leaves the summary to print.
    let detail_err = ctx.dash.load_detail(&ctx.client, origin, id).err();
    let rocket = ctx
        .dash
        .rocket(origin, id)
        .with_context(|| format!("no rocket {} in {}", id, chest_label(origin)))?;
    let view = lock::evaluate(rocket, now);

    println!("id: {}", rocket.id);
    println!("rocket: {}", rocket.rocket_id);
    println!("name: {}", rocket.name);
    if !rocket.design.as_str().is_empty() {
        println!("design: {}", rocket.design.key());
    }
    if let Some(sender) = &rocket.sender {
        println!("from: {}", sender);
    }
    if let Some(receiver) = &rocket.receiver {
        println!("to: {}", receiver);
    }
    println!("state: {} ({})", view.state, view.countdown);
    if !view.hint.is_empty() {
        println!("note: {}", view.hint);
    }

    match lock::reveal(rocket, &view) {
        Some(revealed) => {
            if let Some(content) = revealed.content {
                println!();
                println!("{}", content);
            }
            for a in revealed.attachments {
                println!("attachment: {} {}", a.id, a.original_name);
            }
        }
        None => println!("content: hidden until opened"),
    }

    if let Some(err) = detail_err {
        let msg = err.user_message();
        if err.is_unauthorized() {
            return Err(ctx.fail(err));
        }
        eprintln!("could not load details: {}", msg);
    }
    Ok(())
}

pub(super) fn handle_unlock_command(
    store: &LocalStore,
    id: &ItemId,
    list: Option<Origin>,
) -> Result<()> {
    let mut ctx = CommandCtx::open(store)?;
    let candidates = match list {
        Some(origin) => vec![origin],
        None => vec![Origin::Own, Origin::Received],
    };

    let mut found = None;
    for origin in candidates {
        if let Err(err) = ctx.dash.refresh_list(&ctx.client, origin) {
            return Err(ctx.fail(err));
        }
        let present = ctx
            .dash
            .chest(origin)
            .is_ok_and(|book| book.get(id).is_some());
        if present {
            found = Some(origin);
            break;
        }
    }
    let origin = found.with_context(|| format!("no rocket {} to unlock", id))?;

    let now = SystemClock.now();
    if let Err(err) = ctx.dash.unlock(&ctx.client, origin, id, now) {
        return Err(ctx.fail(err));
    }
    println!("Opened {}", id);
    Ok(())
}

pub(super) fn handle_toggle_command(store: &LocalStore, id: &ItemId) -> Result<()> {
    let mut ctx = CommandCtx::open(store)?;
    if let Err(err) = ctx.dash.refresh_list(&ctx.client, Origin::Received) {
        return Err(ctx.fail(err));
    }
    let now = SystemClock.now();
    let is_public = match ctx.dash.toggle_visibility(&ctx.client, id, now) {
        Ok(is_public) => is_public,
        Err(err) => return Err(ctx.fail(err)),
    };
    if is_public {
        match ctx.dash.grid().position(id) {
            Some(i) => println!("{} is on display in slot {}", id, i + 1),
            None => println!("{} is on display", id),
        }
    } else {
        println!("{} is no longer on display", id);
    }
    Ok(())
}

pub(super) fn handle_download_command(
    store: &LocalStore,
    file_id: &str,
    out: Option<PathBuf>,
) -> Result<()> {
    let mut ctx = CommandCtx::open(store)?;
    let bytes = match ctx.client.download(file_id) {
        Ok(bytes) => bytes,
        Err(err) => return Err(ctx.fail(err.into())),
    };
    let path = out.unwrap_or_else(|| PathBuf::from(file_id));
    std::fs::write(&path, &bytes).with_context(|| format!("write {}", path.display()))?;
    println!("Saved {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

fn ctx_err(err: rocketbox::error::CoreError) -> anyhow::Error {
    anyhow::anyhow!(err.user_message())
}

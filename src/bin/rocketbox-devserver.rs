//! In-memory rocket server for local development and the integration tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Extension, Path, State};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use clap::Parser;
use serde_json::{Value, json};
use time::OffsetDateTime;
use tokio::sync::RwLock;

#[path = "rocketbox_devserver/http_error.rs"]
mod http_error;
use self::http_error::*;
#[path = "rocketbox_devserver/fixtures.rs"]
mod fixtures;
use self::fixtures::*;
#[path = "rocketbox_devserver/world.rs"]
mod world;
use self::world::*;
#[path = "rocketbox_devserver/handlers_auth.rs"]
mod handlers_auth;
use self::handlers_auth::*;
#[path = "rocketbox_devserver/handlers_chests.rs"]
mod handlers_chests;
use self::handlers_chests::*;
#[path = "rocketbox_devserver/handlers_displays.rs"]
mod handlers_displays;
use self::handlers_displays::*;

#[derive(Clone, Debug)]
struct Subject {
    member_id: u64,
}

struct AppState {
    world: RwLock<World>,
    access_ttl: time::Duration,
    reject_moves: bool,
}

#[derive(Parser)]
#[command(name = "rocketbox-devserver")]
#[command(about = "In-memory rocket server (development)", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: SocketAddr,

    /// Write bound address to this file (dev/test convenience)
    #[arg(long)]
    addr_file: Option<PathBuf>,

    /// JSON fixture file replacing the built-in sample data
    #[arg(long)]
    fixtures: Option<PathBuf>,

    /// Login email of the development member
    #[arg(long, default_value = "dev@rocketbox.local")]
    dev_email: String,

    /// Password of the development member
    #[arg(long, default_value = "dev")]
    dev_password: String,

    /// Lifetime of issued access tokens
    #[arg(long, default_value_t = 900)]
    access_ttl_secs: i64,

    /// Reject every display rearrangement with 409
    #[arg(long)]
    reject_moves: bool,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();
    rocketbox::logging::init_stderr();

    let fixtures = match &args.fixtures {
        Some(path) => load_fixtures(path)?,
        None => sample_fixtures(&args.dev_email, &args.dev_password),
    };
    let world = World::from_fixtures(fixtures, OffsetDateTime::now_utc())
        .context("build world from fixtures")?;
    tracing::info!(
        members = world.member_count(),
        rockets = world.rocket_count(),
        "fixtures loaded"
    );

    let state = Arc::new(AppState {
        world: RwLock::new(world),
        access_ttl: time::Duration::seconds(args.access_ttl_secs),
        reject_moves: args.reject_moves,
    });

    let authed = Router::new()
        .route("/auth/logout", post(logout))
        .route("/members/me", get(me))
        .route("/rockets", get(list_own))
        .route("/rockets/:id", get(own_detail))
        .route("/rockets/:id/unlock", patch(unlock_rocket))
        .route("/received-chests", get(list_received))
        .route("/received-chests/:id", get(received_detail))
        .route("/received-chests/:id/visibility", patch(toggle_visibility))
        .route("/sent-chests", get(list_sent))
        .route("/sent-chests/:id", get(sent_detail))
        .route("/group-chests", get(list_group))
        .route("/group-chests/:id", get(group_detail))
        .route("/displays", get(list_displays))
        .route("/displays/location", patch(swap_locations))
        .route("/displays/:id", get(display_detail))
        .route("/displays/:id/move-to-empty", patch(move_to_empty))
        .route("/files/:id/download", get(download_file))
        .layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .merge(authed)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("bind {}", args.addr))?;

    let local_addr = listener.local_addr().context("read listener local addr")?;
    eprintln!("rocketbox-devserver listening on {}", local_addr);

    if let Some(addr_file) = &args.addr_file {
        std::fs::write(addr_file, local_addr.to_string())
            .with_context(|| format!("write addr file {}", addr_file.display()))?;
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

async fn require_bearer(
    State(state): State<Arc<AppState>>,
    req: axum::extract::Request,
    next: Next,
) -> Response {
    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return unauthorized();
    };
    let Ok(value) = value.to_str() else {
        return unauthorized();
    };
    let Some(token) = value.strip_prefix("Bearer ") else {
        return unauthorized();
    };

    let member_id = {
        let world = state.world.read().await;
        world.authenticate(token, OffsetDateTime::now_utc())
    };
    let Some(member_id) = member_id else {
        return unauthorized();
    };

    let mut req = req;
    req.extensions_mut().insert(Subject { member_id });
    next.run(req).await
}

async fn healthz() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

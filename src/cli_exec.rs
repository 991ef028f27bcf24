use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use time::OffsetDateTime;

use rocketbox::dashboard::Dashboard;
use rocketbox::lock;
use rocketbox::model::{ItemId, Origin, Rocket};
use rocketbox::remote::RemoteClient;
use rocketbox::session::Session;
use rocketbox::store::LocalStore;

use crate::cli_commands::Commands;
use crate::cli_runtime::{connect, surface};

mod chests;
mod display;
mod session;

pub(crate) fn handle_command(root: &Path, command: Commands) -> Result<()> {
    match command {
        Commands::Login(args) => {
            let store = LocalStore::open_or_init(root)?;
            session::handle_login_command(&store, args.url, &args.email, &args.password)
        }
        Commands::Logout => with_store(root, session::handle_logout_command),
        Commands::Whoami(args) => {
            with_store(root, |store| session::handle_whoami_command(store, args.json))
        }
        Commands::List(args) => with_store(root, |store| {
            chests::handle_list_command(store, args.list, args.json)
        }),
        Commands::Show(args) => with_store(root, |store| {
            chests::handle_show_command(store, args.list, &ItemId::from(args.id.as_str()))
        }),
        Commands::Unlock(args) => with_store(root, |store| {
            chests::handle_unlock_command(store, &ItemId::from(args.id.as_str()), args.list)
        }),
        Commands::Toggle(args) => with_store(root, |store| {
            chests::handle_toggle_command(store, &ItemId::from(args.id.as_str()))
        }),
        Commands::Download(args) => with_store(root, |store| {
            chests::handle_download_command(store, &args.file_id, args.out)
        }),
        Commands::Grid(args) => {
            with_store(root, |store| display::handle_grid_command(store, args.json))
        }
        Commands::Swap(args) => with_store(root, |store| {
            let (from, to) = args.indices();
            display::handle_swap_command(store, from, to)
        }),
        Commands::Move(args) => with_store(root, |store| {
            let (from, to) = args.indices();
            display::handle_move_command(store, from, to)
        }),
    }
}

fn with_store<T>(root: &Path, f: impl FnOnce(&LocalStore) -> Result<T>) -> Result<T> {
    let store = LocalStore::open(root)?;
    f(&store)
}

/// Everything a remote command needs, opened from the state dir.
struct CommandCtx {
    store: LocalStore,
    client: RemoteClient,
    session: Session,
    dash: Dashboard,
}

impl CommandCtx {
    fn open(store: &LocalStore) -> Result<Self> {
        let (client, session) = connect(store)?;
        let unlocked = store.unlocked_set()?;
        Ok(Self {
            store: store.clone(),
            client,
            session,
            dash: Dashboard::new(unlocked),
        })
    }

    fn fail(&mut self, err: rocketbox::error::CoreError) -> anyhow::Error {
        surface(&self.store, &mut self.session, err)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RocketRow {
    id: String,
    rocket_id: String,
    list: String,
    name: String,
    state: String,
    countdown: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    receiver: Option<String>,
    is_public: bool,
    /// 1-based, as shown to humans.
    #[serde(skip_serializing_if = "Option::is_none")]
    display_location: Option<usize>,
}

impl RocketRow {
    fn new(rocket: &Rocket, now: OffsetDateTime) -> Self {
        let view = lock::evaluate(rocket, now);
        Self {
            id: rocket.id.to_string(),
            rocket_id: rocket.rocket_id.to_string(),
            list: rocket.origin.to_string(),
            name: rocket.name.clone(),
            state: view.state.to_string(),
            countdown: view.countdown,
            sender: rocket.sender.clone(),
            receiver: rocket.receiver.clone(),
            is_public: rocket.is_public,
            display_location: rocket.display_location.map(|i| i + 1),
        }
    }
}

fn print_json<T: Serialize>(value: &T, what: &str) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).with_context(|| format!("serialize {} json", what))?
    );
    Ok(())
}

fn chest_label(origin: Origin) -> &'static str {
    match origin {
        Origin::Own => "own rockets",
        Origin::Received => "received chests",
        Origin::Sent => "sent chests",
        Origin::Group => "group chests",
        Origin::Display => "display",
    }
}

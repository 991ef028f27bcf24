use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use rocketbox::error::CoreError;
use rocketbox::model::RemoteConfig;
use rocketbox::remote::RemoteClient;
use rocketbox::session::Session;
use rocketbox::store::LocalStore;

use crate::cli_commands::Commands;

#[derive(Parser)]
#[command(name = "rocketbox")]
#[command(about = "Time-locked rockets and their display shelf", long_about = None)]
pub(crate) struct Cli {
    /// State directory (defaults to $ROCKETBOX_HOME or ~/.rocketbox)
    #[arg(long = "state-dir", value_name = "PATH", global = true)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

pub(crate) fn run() -> Result<()> {
    let cli = Cli::parse();
    let root = match cli.state_dir {
        Some(dir) => dir,
        None => LocalStore::default_dir()?,
    };

    match cli.command {
        None => {
            let store = LocalStore::open_or_init(&root)?;
            rocketbox::logging::init_file(&store.log_path())?;
            rocketbox::tui::run(store)?;
        }
        Some(command) => {
            rocketbox::logging::init_stderr();
            crate::cli_exec::handle_command(&root, command)?
        }
    }

    Ok(())
}

pub(crate) fn require_remote(store: &LocalStore) -> Result<RemoteConfig> {
    let cfg = store.read_config()?;
    cfg.remote
        .context("no server configured (run `rocketbox login --url ... --email ... --password ...`)")
}

/// Client built from the stored session. Refreshed tokens are written back to `store`.
pub(crate) fn connect(store: &LocalStore) -> Result<(RemoteClient, Session)> {
    let remote = require_remote(store)?;
    let rec = store.read_session()?;
    let credentials = rec
        .credentials
        .context("not logged in (run `rocketbox login --url ... --email ... --password ...`)")?;
    let client = RemoteClient::new(remote, credentials)?.with_store(store.clone());
    let session = match rec.profile {
        Some(profile) => Session::signed_in(profile),
        None => Session::signed_out(),
    };
    Ok((client, session))
}

/// Turns a core failure into the message the user sees. An expired session
/// is also forgotten locally.
pub(crate) fn surface(store: &LocalStore, session: &mut Session, err: CoreError) -> anyhow::Error {
    session.observe(&err);
    if err.is_unauthorized()
        && let Err(clear) = store.clear_session()
    {
        tracing::warn!(error = %format!("{:#}", clear), "could not clear expired session");
    }
    tracing::debug!(error = %err, "command failed");
    anyhow::anyhow!(err.user_message())
}

use std::path::PathBuf;

use clap::{Args, Subcommand};

use rocketbox::model::Origin;

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Log in and remember the server
    Login(LoginArgs),
    /// Forget the stored session
    Logout,
    /// Show the logged-in member
    Whoami(JsonArgs),
    /// List rockets in a chest list with their lock state
    List(ListArgs),
    /// Show one rocket; content is revealed only once it is opened
    Show(ShowArgs),
    /// Open a rocket whose timer has run out
    Unlock(UnlockArgs),
    /// Put a received rocket on display, or take it off
    Toggle(ToggleArgs),
    /// Show the display grid
    Grid(JsonArgs),
    /// Swap two occupied display slots
    Swap(SlotPair),
    /// Move a displayed rocket into an empty slot
    Move(SlotPair),
    /// Download an attachment
    Download(DownloadArgs),
}

#[derive(Args)]
pub(crate) struct LoginArgs {
    #[arg(long)]
    pub(crate) url: String,
    #[arg(long)]
    pub(crate) email: String,
    #[arg(long)]
    pub(crate) password: String,
}

#[derive(Args)]
pub(crate) struct JsonArgs {
    /// Emit JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args)]
pub(crate) struct ListArgs {
    /// own, received, sent or group
    #[arg(default_value = "own", value_parser = parse_chest)]
    pub(crate) list: Origin,
    /// Emit JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args)]
pub(crate) struct ShowArgs {
    /// own, received, sent, group or display
    #[arg(value_parser = parse_list)]
    pub(crate) list: Origin,
    pub(crate) id: String,
}

#[derive(Args)]
pub(crate) struct UnlockArgs {
    pub(crate) id: String,
    /// List holding the rocket (searches own, then received)
    #[arg(long, value_parser = parse_chest)]
    pub(crate) list: Option<Origin>,
}

#[derive(Args)]
pub(crate) struct ToggleArgs {
    /// Received chest id
    pub(crate) id: String,
}

#[derive(Args)]
pub(crate) struct SlotPair {
    /// Slot number, 1 to 10
    #[arg(value_parser = clap::value_parser!(u16).range(1..=10))]
    pub(crate) from: u16,
    /// Slot number, 1 to 10
    #[arg(value_parser = clap::value_parser!(u16).range(1..=10))]
    pub(crate) to: u16,
}

impl SlotPair {
    /// 0-based grid indices.
    pub(crate) fn indices(&self) -> (usize, usize) {
        (usize::from(self.from) - 1, usize::from(self.to) - 1)
    }
}

#[derive(Args)]
pub(crate) struct DownloadArgs {
    pub(crate) file_id: String,
    /// Output path (defaults to the file id in the current directory)
    #[arg(long)]
    pub(crate) out: Option<PathBuf>,
}

fn parse_chest(s: &str) -> Result<Origin, String> {
    match Origin::parse(s) {
        Some(Origin::Display) | None => {
            Err(format!("unknown list '{}' (own, received, sent, group)", s))
        }
        Some(origin) => Ok(origin),
    }
}

fn parse_list(s: &str) -> Result<Origin, String> {
    Origin::parse(s).ok_or_else(|| format!("unknown list '{}' (own, received, sent, group, display)", s))
}

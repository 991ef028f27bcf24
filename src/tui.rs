use anyhow::Result;

use crate::store::LocalStore;

/// Opens the full-screen dashboard on the session stored in `store`.
pub fn run(store: LocalStore) -> Result<()> {
    crate::tui_shell::run(store)
}

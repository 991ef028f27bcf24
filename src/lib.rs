pub mod chest;
pub mod clock;
pub mod dashboard;
pub mod display;
pub mod error;
pub mod gate;
pub mod lock;
pub mod logging;
pub mod model;
pub mod remote;
pub mod session;
pub mod store;
pub mod tui;

mod tui_shell;

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

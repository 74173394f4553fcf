//! Line-oriented shell that drives the payment wizard from a terminal or a
//! script on stdin.

pub mod core;
mod handlers;
pub mod output;
pub mod registry;
pub mod shell;

pub use self::core::{CliError, CliMode, CommandError, CommandResult, ShellContext};
pub use shell::run_cli;

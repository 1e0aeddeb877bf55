//! Command dispatch: bridges CLI args -> controller operations -> output.

pub mod config_cmd;
pub mod logs;
pub mod mode;
pub mod servers;
pub mod services;
pub mod status;
pub mod util;
pub mod watch;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(global).await,
        Command::Services(args) => services::handle(args, global).await,
        Command::Servers(args) => servers::handle(args, global).await,
        Command::Mode { service, mode } => mode::handle(&service, mode, global).await,
        Command::Logs => logs::handle(global).await,
        Command::Watch => watch::handle(global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}

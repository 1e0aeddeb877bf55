//! Mode command handler.

use crate::cli::{GlobalOpts, ModeArg};
use crate::error::CliError;

use super::util;

pub async fn handle(service: &str, mode: ModeArg, global: &GlobalOpts) -> Result<(), CliError> {
    let controller = util::controller(global)?;
    let mode: lbdash_api::Mode = mode.into();
    controller.set_mode(service, mode).await?;
    util::notice(
        &format!("Mode for '{service}' set to {mode}"),
        global.quiet,
    );
    Ok(())
}

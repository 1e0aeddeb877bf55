//! Shared helpers for command handlers.

use std::sync::Arc;

use lbdash_core::{AssumeYes, ConfirmGate, Controller};

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;

/// Confirmation gate backed by an interactive dialoguer prompt.
struct PromptGate;

impl ConfirmGate for PromptGate {
    fn confirm(&self, prompt: &str) -> bool {
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

/// The gate for destructive operations: `--yes` approves everything,
/// otherwise prompt interactively.
pub fn gate(global: &GlobalOpts) -> Arc<dyn ConfirmGate> {
    if global.yes {
        Arc::new(AssumeYes)
    } else {
        Arc::new(PromptGate)
    }
}

/// Build a one-shot controller from the resolved configuration.
pub fn controller(global: &GlobalOpts) -> Result<Controller, CliError> {
    let controller_config = config::resolve(global)?;
    Ok(Controller::new(controller_config, gate(global))?)
}

/// Print a short completion notice to stderr, respecting quiet mode.
pub fn notice(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{message}");
    }
}

//! Watch command: a live, self-refreshing status view.
//!
//! Runs the full controller lifecycle — probing, periodic refresh, and
//! the log stream — re-rendering on every state change until Ctrl-C.

use lbdash_core::{Controller, DashboardStore};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::{status, util};

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let mut controller_config = config::resolve(global)?;
    controller_config.stream_enabled = true;
    let controller = Controller::new(controller_config, util::gate(global))?;
    controller.start().await;

    let store = controller.store();
    let mut conn = store.subscribe_connectivity();
    let mut view = store.subscribe_view();
    let mut error = store.subscribe_error();
    let mut logs = store.subscribe_log_version();
    let color = output::should_color(&global.color);
    let mut printed_logs = 0usize;

    render_frame(store, &global.output, color, global.quiet);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            res = conn.changed() => {
                if res.is_err() { break; }
                render_frame(store, &global.output, color, global.quiet);
            }
            res = view.changed() => {
                if res.is_err() { break; }
                render_frame(store, &global.output, color, global.quiet);
            }
            res = error.changed() => {
                if res.is_err() { break; }
                if let Some(err) = store.last_error() {
                    eprintln!("error: {err}");
                }
            }
            res = logs.changed() => {
                if res.is_err() { break; }
                let lines = store.logs();
                // The buffer only shrinks on an explicit clear.
                if lines.len() < printed_logs {
                    printed_logs = 0;
                }
                for line in &lines[printed_logs..] {
                    println!("{line}");
                }
                printed_logs = lines.len();
            }
        }
    }

    controller.shutdown().await;
    Ok(())
}

fn render_frame(store: &DashboardStore, format: &OutputFormat, color: bool, quiet: bool) {
    if quiet {
        return;
    }
    let snap = store.snapshot();
    let label = status::connectivity_label(snap.connectivity);
    println!("== backend: {label} ==");

    let entries = status::status_entries(&snap.view);
    if !entries.is_empty() {
        println!("{}", status::render(&entries, format, color));
    }
}

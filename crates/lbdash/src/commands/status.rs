//! Status command: one table of per-server health across all services.

use serde::Serialize;
use tabled::Tabled;

use lbdash_core::{ConnectivityState, ServiceView};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct StatusEntry {
    pub service: String,
    pub mode: String,
    pub server: String,
    pub check: String,
    pub status: String,
}

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Server")]
    server: String,
    #[tabled(rename = "Check")]
    check: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// Human-readable backend reachability label.
pub fn connectivity_label(state: ConnectivityState) -> &'static str {
    match state {
        ConnectivityState::Probing => "probing",
        ConnectivityState::Unavailable => "unavailable",
        ConnectivityState::Available => "available",
    }
}

/// Flatten the view into one entry per server, joining each server to
/// its health label via the composite status key.
pub fn status_entries(view: &ServiceView) -> Vec<StatusEntry> {
    let mut entries = Vec::new();
    for service in &view.services {
        let health = view.status.get(&service.name);
        for server in &service.servers {
            let key = server.status_key();
            let status = health
                .and_then(|h| h.get(&key))
                .cloned()
                .unwrap_or_else(|| "unknown".to_owned());
            entries.push(StatusEntry {
                service: service.name.clone(),
                mode: service.mode.to_string(),
                server: format!("{}:{}", server.ip, server.port),
                check: server.check_type.to_string(),
                status,
            });
        }
    }
    entries
}

/// Render the entries in the chosen format.
pub fn render(entries: &[StatusEntry], format: &OutputFormat, color: bool) -> String {
    output::render_list(
        format,
        entries,
        |e| StatusRow {
            service: e.service.clone(),
            mode: e.mode.clone(),
            server: e.server.clone(),
            check: e.check.clone(),
            status: output::paint_status(&e.status, color),
        },
        |e| format!("{} {} {}", e.service, e.server, e.status),
    )
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let controller = util::controller(global)?;
    controller.refresh().await?;

    let snap = controller.store().snapshot();
    let label = connectivity_label(snap.connectivity);
    if matches!(global.output, OutputFormat::Table) {
        output::print_output(&format!("== backend: {label} =="), global.quiet);
    } else {
        // Keep machine-readable stdout clean.
        util::notice(&format!("backend: {label}"), global.quiet);
    }

    let entries = status_entries(&snap.view);
    if entries.is_empty() {
        util::notice("No services configured", global.quiet);
        return Ok(());
    }

    let color = output::should_color(&global.color);
    let out = render(&entries, &global.output, color);
    output::print_output(&out, global.quiet);
    Ok(())
}

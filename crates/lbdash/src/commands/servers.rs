//! Server command handlers.

use tabled::Tabled;

use lbdash_api::EditServerRequest;
use lbdash_core::MutationOutcome;

use crate::cli::{GlobalOpts, ServersArgs, ServersCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ServerRow {
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Port")]
    port: u16,
    #[tabled(rename = "Check")]
    check: String,
    #[tabled(rename = "HTTP Path")]
    http_path: String,
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ServersArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let controller = util::controller(global)?;

    match args.command {
        ServersCommand::List { service } => {
            let servers = controller.api().list_servers(&service).await?;
            let out = output::render_list(
                &global.output,
                &servers,
                |s| ServerRow {
                    ip: s.ip.clone(),
                    port: s.port,
                    check: s.check_type.to_string(),
                    http_path: s.http_path.clone().unwrap_or_default(),
                },
                |s| format!("{}:{}", s.ip, s.port),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ServersCommand::Add {
            service,
            ip,
            port,
            check_type,
            http_path,
        } => {
            controller
                .add_server(&service, &ip, port, check_type.into(), http_path)
                .await?;
            util::notice(
                &format!("Server {ip}:{port} added to '{service}'"),
                global.quiet,
            );
            Ok(())
        }

        ServersCommand::Edit {
            service,
            ip,
            port,
            new_ip,
            new_port,
            check_type,
        } => {
            let req = EditServerRequest {
                service: service.clone(),
                ip: ip.clone(),
                port,
                new_ip,
                new_port,
                check_type: check_type.map(Into::into),
            };
            controller.edit_server(&req).await?;
            util::notice(&format!("Server {ip}:{port} updated"), global.quiet);
            Ok(())
        }

        ServersCommand::Remove { service, ip, port } => {
            match controller.remove_server(&service, &ip, port).await? {
                MutationOutcome::Applied => {
                    util::notice(
                        &format!("Server {ip}:{port} removed from '{service}'"),
                        global.quiet,
                    );
                }
                MutationOutcome::Declined => {
                    util::notice("Aborted", global.quiet);
                }
            }
            Ok(())
        }
    }
}

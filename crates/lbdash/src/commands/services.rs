//! Service command handlers.

use tabled::Tabled;

use lbdash_api::EditServiceRequest;
use lbdash_core::MutationOutcome;

use crate::cli::{GlobalOpts, ServicesArgs, ServicesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ServiceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Listen Port")]
    listen_port: u16,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Servers")]
    servers: usize,
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ServicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let controller = util::controller(global)?;

    match args.command {
        ServicesCommand::List => {
            controller.refresh().await?;
            let view = controller.store().view();
            let out = output::render_list(
                &global.output,
                &view.services,
                |s| ServiceRow {
                    name: s.name.clone(),
                    listen_port: s.listen_port,
                    mode: s.mode.to_string(),
                    servers: s.servers.len(),
                },
                |s| s.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ServicesCommand::Add {
            name,
            listen_port,
            mode,
        } => {
            controller
                .add_service(&name, listen_port, mode.into())
                .await?;
            util::notice(&format!("Service '{name}' added"), global.quiet);
            Ok(())
        }

        ServicesCommand::Edit {
            name,
            new_name,
            listen_port,
            mode,
        } => {
            let req = EditServiceRequest {
                name: name.clone(),
                new_name,
                listen_port,
                mode: mode.map(Into::into),
            };
            controller.edit_service(&req).await?;
            util::notice(&format!("Service '{name}' updated"), global.quiet);
            Ok(())
        }

        ServicesCommand::Remove { name } => {
            match controller.remove_service(&name).await? {
                MutationOutcome::Applied => {
                    util::notice(&format!("Service '{name}' removed"), global.quiet);
                }
                MutationOutcome::Declined => {
                    util::notice("Aborted", global.quiet);
                }
            }
            Ok(())
        }
    }
}

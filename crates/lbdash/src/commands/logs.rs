//! Log streaming: follow the backend's live log feed.

use tokio_util::sync::CancellationToken;

use lbdash_api::{ApiClient, LogStreamEvent, LogStreamHandle, ReconnectPolicy};

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;

use super::util;

/// Connect to the log stream and print lines until Ctrl-C. Closes are
/// reported on stderr; the stream reconnects on its own.
pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let controller_config = config::resolve(global)?;
    let api = ApiClient::new(
        controller_config.base_url.clone(),
        controller_config.request_timeout,
    )?;

    let cancel = CancellationToken::new();
    let handle = LogStreamHandle::connect(
        api.ws_url()?,
        ReconnectPolicy {
            delay: controller_config.reconnect_delay,
        },
        cancel.clone(),
    );
    let mut events = handle.subscribe();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(event) => match event.as_ref() {
                    LogStreamEvent::Opened => {
                        util::notice("-- log stream connected --", global.quiet);
                    }
                    LogStreamEvent::Line(line) => println!("{line}"),
                    LogStreamEvent::Closed { reason } => {
                        let reason = reason.as_deref().unwrap_or("connection closed");
                        util::notice(
                            &format!("-- log stream lost ({reason}), reconnecting --"),
                            global.quiet,
                        );
                    }
                },
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    handle.shutdown();
    Ok(())
}

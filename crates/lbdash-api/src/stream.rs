//! Log stream with auto-reconnect.
//!
//! Connects to the backend's `/ws` endpoint and forwards every inbound
//! text frame — one frame, one log line — through a
//! [`tokio::sync::broadcast`] channel. After any close or error, exactly
//! one reconnect attempt is scheduled after a fixed delay. Nothing is
//! ever written to the stream.
//!
//! # Example
//!
//! ```rust,ignore
//! use lbdash_api::stream::{LogStreamEvent, LogStreamHandle, ReconnectPolicy};
//! use tokio_util::sync::CancellationToken;
//! use url::Url;
//!
//! let cancel = CancellationToken::new();
//! let ws_url = Url::parse("ws://127.0.0.1:5000/ws")?;
//!
//! let handle = LogStreamHandle::connect(ws_url, ReconnectPolicy::default(), cancel.clone());
//! let mut rx = handle.subscribe();
//!
//! while let Ok(event) = rx.recv().await {
//!     if let LogStreamEvent::Line(line) = event.as_ref() {
//!         println!("{line}");
//!     }
//! }
//!
//! handle.shutdown();
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;

const EVENT_CHANNEL_CAPACITY: usize = 1024;

// ── Events ───────────────────────────────────────────────────────────

/// Lifecycle and data events emitted by the stream task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogStreamEvent {
    /// Connection established. Consumers clear any stream-level error.
    Opened,
    /// One inbound text frame, verbatim — no parsing, no deduplication.
    Line(String),
    /// Connection lost (error or graceful remote close). A reconnect is
    /// already scheduled when this is observed.
    Closed { reason: Option<String> },
}

// ── ReconnectPolicy ──────────────────────────────────────────────────

/// Fixed-delay reconnection policy. Every close schedules exactly one
/// reconnect attempt after `delay`; there is no retry limit — only
/// shutdown stops the loop.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(5),
        }
    }
}

// ── LogStreamHandle ──────────────────────────────────────────────────

/// Handle to a running log-stream task.
///
/// Call [`shutdown`](Self::shutdown) to tear down the background task;
/// cancellation also releases any pending reconnect timer.
pub struct LogStreamHandle {
    event_rx: broadcast::Receiver<Arc<LogStreamEvent>>,
    cancel: CancellationToken,
}

impl LogStreamHandle {
    /// Spawn the reconnection loop for the given stream URL.
    ///
    /// Returns immediately; the first connection attempt happens
    /// asynchronously. Subscribe to the event receiver to observe it.
    pub fn connect(ws_url: Url, policy: ReconnectPolicy, cancel: CancellationToken) -> Self {
        let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            stream_loop(ws_url, event_tx, policy, task_cancel).await;
        });

        Self { event_rx, cancel }
    }

    /// Get a new broadcast receiver for the event stream.
    ///
    /// A consumer that falls behind receives
    /// [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<LogStreamEvent>> {
        self.event_rx.resubscribe()
    }

    /// Signal the background task to shut down, cancelling any pending
    /// reconnect.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → read until closed → wait the fixed delay →
/// reconnect. Only cancellation exits.
async fn stream_loop(
    ws_url: Url,
    event_tx: broadcast::Sender<Arc<LogStreamEvent>>,
    policy: ReconnectPolicy,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&ws_url, &event_tx, &cancel) => {
                if cancel.is_cancelled() {
                    break;
                }
                let reason = match result {
                    Ok(()) => {
                        tracing::info!("log stream closed by remote");
                        None
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "log stream error");
                        Some(e.to_string())
                    }
                };
                let _ = event_tx.send(Arc::new(LogStreamEvent::Closed { reason }));

                // Exactly one reconnect, no earlier than the fixed delay.
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(policy.delay) => {}
                }
            }
        }
    }

    tracing::debug!("log stream loop exiting");
}

/// Establish a single connection and forward frames until it drops.
///
/// `Ok(())` means a graceful close (close frame or stream end); `Err`
/// means a connect or transport failure. Either way the caller
/// schedules the reconnect.
async fn connect_and_read(
    url: &Url,
    event_tx: &broadcast::Sender<Arc<LogStreamEvent>>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::debug!(url = %url, "connecting to log stream");

    let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| Error::StreamConnect(e.to_string()))?;

    tracing::info!("log stream connected");
    let _ = event_tx.send(Arc::new(LogStreamEvent::Opened));

    let (_write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        let _ = event_tx.send(Arc::new(LogStreamEvent::Line(text.to_string())));
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        // tungstenite answers pongs automatically
                        tracing::trace!("log stream ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(code = %cf.code, reason = %cf.reason, "close frame received");
                        }
                        return Ok(());
                    }
                    Some(Err(e)) => {
                        return Err(Error::StreamConnect(e.to_string()));
                    }
                    None => {
                        // Stream ended without a close frame
                        return Ok(());
                    }
                    _ => {
                        // Binary, Pong, Frame — ignored
                    }
                }
            }
        }
    }
}

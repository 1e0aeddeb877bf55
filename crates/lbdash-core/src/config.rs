use std::time::Duration;

use url::Url;

/// Controller configuration.
///
/// The intervals mirror the backend's operational contract: probe every
/// 5s while unreachable, refresh every 15s while available, reconnect
/// the log stream 5s after any close.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Backend root URL, e.g. `http://127.0.0.1:5000`.
    pub base_url: Url,
    /// Probe cadence while the backend is not `Available`.
    pub probe_interval: Duration,
    /// Periodic refresh cadence while `Available`.
    pub refresh_interval: Duration,
    /// Fixed delay before a log-stream reconnect attempt.
    pub reconnect_delay: Duration,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Whether to open the log stream at all (disabled by one-shot CLI
    /// commands and most tests).
    pub stream_enabled: bool,
}

impl ControllerConfig {
    /// Configuration with the standard cadences for the given backend.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            probe_interval: Duration::from_secs(5),
            refresh_interval: Duration::from_secs(15),
            reconnect_delay: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            stream_enabled: true,
        }
    }
}

use thiserror::Error;

/// Top-level error type for the `lbdash-api` crate.
///
/// Covers every failure mode of the backend surface: HTTP transport,
/// malformed payloads, application-level rejections, and the log stream.
/// `lbdash-core` maps these into user-facing operation errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Backend ─────────────────────────────────────────────────────
    /// Application-level rejection from the backend, with the reason
    /// extracted from the `{"detail": ...}` error body when present.
    #[error("Backend rejected request (HTTP {status}): {message}")]
    Backend { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// Response body was not the expected JSON shape (protocol mismatch).
    /// Carries the raw body for debugging.
    #[error("Malformed response payload: {message}")]
    Deserialization { message: String, body: String },

    // ── Log stream ──────────────────────────────────────────────────
    /// WebSocket connection to the log stream failed.
    #[error("Log stream connection failed: {0}")]
    StreamConnect(String),
}

impl Error {
    /// Returns `true` if this is a transient transport-level failure
    /// (as opposed to an explicit backend rejection).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::StreamConnect(_) => true,
            _ => false,
        }
    }

    /// The backend-supplied rejection reason, if this error carries one.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Backend { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}

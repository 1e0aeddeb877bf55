use thiserror::Error;

/// Errors produced by the controller layer.
///
/// Transport and backend failures pass through from `lbdash-api`;
/// local precondition failures are reported before any request is sent.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Failure from the backend API surface (transport, protocol
    /// mismatch, or application-level rejection).
    #[error(transparent)]
    Api(#[from] lbdash_api::Error),

    /// A service or server name failed local validation.
    #[error("Name must not be empty")]
    EmptyName,

    /// A port failed local validation (ports are 1-65535).
    #[error("Port must be between 1 and 65535")]
    InvalidPort,
}

impl CoreError {
    /// The backend-supplied rejection reason, if any.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Api(e) => e.backend_message(),
            _ => None,
        }
    }
}

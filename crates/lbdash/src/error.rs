//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use lbdash_core::CoreError;

/// Exit codes for process termination.
#[allow(dead_code)]
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const REJECTED: i32 = 3;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the backend")]
    #[diagnostic(
        code(lbdash::connection_failed),
        help(
            "Check that the load balancer is running and the URL is right.\n\
             Try: lbdash status --backend http://127.0.0.1:5000"
        )
    )]
    Connection {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Backend rejection ────────────────────────────────────────────

    #[error("Backend rejected the request: {message}")]
    #[diagnostic(code(lbdash::rejected))]
    Rejected { message: String },

    /// Success status with a body the client cannot parse.
    #[error("Unexpected backend response: {message}")]
    #[diagnostic(
        code(lbdash::protocol),
        help("The backend answered but not in the expected shape — version mismatch?")
    )]
    Protocol { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(lbdash::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("No backend configured")]
    #[diagnostic(
        code(lbdash::no_config),
        help(
            "Pass --backend <URL>, set LBDASH_BACKEND, or create a config:\n\
             lbdash config init http://127.0.0.1:5000\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(lbdash::profile_not_found),
        help("Check `lbdash config show` for the available profiles.")
    )]
    ProfileNotFound { name: String },

    #[error(transparent)]
    #[diagnostic(code(lbdash::config))]
    Config(Box<figment::Error>),

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    #[diagnostic(code(lbdash::toml))]
    Toml(#[from] toml::ser::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Connection { .. } => exit_code::CONNECTION,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Validation { .. } | Self::NoConfig { .. } | Self::ProfileNotFound { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Api(api_err) => api_err.into(),

            CoreError::EmptyName => CliError::Validation {
                field: "name".into(),
                reason: "must not be empty".into(),
            },

            CoreError::InvalidPort => CliError::Validation {
                field: "port".into(),
                reason: "must be between 1 and 65535".into(),
            },
        }
    }
}

impl From<lbdash_api::Error> for CliError {
    fn from(err: lbdash_api::Error) -> Self {
        match err {
            lbdash_api::Error::Backend { message, .. } => CliError::Rejected { message },

            lbdash_api::Error::Deserialization { message, .. } => CliError::Protocol { message },

            lbdash_api::Error::InvalidUrl(e) => CliError::Validation {
                field: "backend".into(),
                reason: e.to_string(),
            },

            e @ (lbdash_api::Error::Transport(_) | lbdash_api::Error::StreamConnect(_)) => {
                CliError::Connection { source: e.into() }
            }
        }
    }
}

//! Reactive runtime between `lbdash-api` and UI consumers.
//!
//! This crate owns the client-side state machine for the load-balancer
//! dashboard:
//!
//! - **[`Controller`]** — Central facade managing the full lifecycle:
//!   [`start()`](Controller::start) probes the backend until reachable,
//!   pulls an initial snapshot, then keeps it fresh with a periodic
//!   refresh timer and a self-reconnecting log stream. All mutations
//!   (mode changes, service/server CRUD) route through it.
//!
//! - **[`DashboardStore`]** — Reactive storage built on
//!   `tokio::sync::watch` channels. Holds connectivity, the atomic
//!   services+status pair, the append-only log buffer, and the current
//!   operation error.
//!
//! - **[`ConfirmGate`]** — Injected yes/no decision point consulted
//!   before destructive operations; declining sends zero requests.

pub mod config;
pub mod confirm;
pub mod controller;
pub mod error;
pub mod store;
pub mod task;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ControllerConfig;
pub use confirm::{AssumeYes, ConfirmGate, DenyAll};
pub use controller::{Controller, MutationOutcome};
pub use error::CoreError;
pub use store::{
    ConnectivityState, DashboardStore, ErrorScope, OperationError, ServiceView, Snapshot,
};
pub use task::{Schedule, TimerHandle};

//! Async client for the load-balancer control-plane backend.
//!
//! Two surfaces:
//!
//! - **[`ApiClient`]** — typed REST client: health probe, service/status
//!   reads, and every mutation (add/edit/remove service or server, set
//!   mode). FastAPI-style `{"detail": ...}` rejections are surfaced as
//!   [`Error::Backend`] with the backend's reason string.
//! - **[`stream`]** — the reconnecting WebSocket log stream: one inbound
//!   text frame per log line, fixed-delay reconnect, cancellation-scoped
//!   shutdown.
//!
//! `lbdash-core` builds the connectivity state machine and the
//! dashboard store on top of this crate.

pub mod client;
pub mod error;
pub mod models;
pub mod stream;

pub use client::{ApiClient, add_server_request};
pub use error::Error;
pub use models::{
    Ack, AddServerRequest, AddServiceRequest, CheckType, EditServerRequest, EditServiceRequest,
    Mode, RemoveServerRequest, RemoveServiceRequest, Server, ServerList, Service, ServiceList,
    StatusMap, StatusSnapshot, label_is_up,
};
pub use stream::{LogStreamEvent, LogStreamHandle, ReconnectPolicy};

//! Domain model and wire payloads for the load-balancer backend.
//!
//! Field names follow the backend exactly — these structs serialize
//! straight into request bodies and deserialize straight out of
//! responses, no conversion layer in between.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ── Enums ────────────────────────────────────────────────────────────

/// Health-check protocol used against a backend server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CheckType {
    Tcp,
    Http,
    Smpp,
}

/// Traffic distribution policy for a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Mode {
    Failover,
    RoundRobin,
}

impl Default for Mode {
    fn default() -> Self {
        Self::Failover
    }
}

// ── Entities ─────────────────────────────────────────────────────────

/// One backend target with a health-check method.
///
/// Identity within a service is `(ip, port)`. `http_path` is only
/// meaningful when `check_type` is [`CheckType::Http`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub ip: String,
    pub port: u16,
    #[serde(default = "default_check_type")]
    pub check_type: CheckType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_path: Option<String>,
}

fn default_check_type() -> CheckType {
    CheckType::Tcp
}

impl Server {
    /// The composite key the backend uses in the status map:
    /// `"ip:port (check_type)"`.
    pub fn status_key(&self) -> String {
        format!("{}:{} ({})", self.ip, self.port, self.check_type)
    }
}

/// A named virtual listener with a mode and a set of backend servers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub listen_port: u16,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub servers: Vec<Server>,
}

/// Service name → composite server key → free-form health label.
///
/// Insertion order is preserved so the dashboard renders rows in the
/// order the backend reports them.
pub type StatusMap = IndexMap<String, IndexMap<String, String>>;

/// Health-label convention: a label containing the substring `UP` is
/// healthy; anything else is down/unknown.
pub fn label_is_up(label: &str) -> bool {
    label.contains("UP")
}

// ── Response envelopes ───────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceList {
    pub services: Vec<Service>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerList {
    pub servers: Vec<Server>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusSnapshot {
    pub services: StatusMap,
}

/// Acknowledgement body for mutations: `{"message": "..."}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

// ── Request payloads ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct SetModeRequest {
    pub service: String,
    pub mode: Mode,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddServiceRequest {
    pub name: String,
    pub listen_port: u16,
    pub mode: Mode,
}

/// Partial update — unset fields are left unchanged server-side.
#[derive(Debug, Clone, Serialize)]
pub struct EditServiceRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listen_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoveServiceRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddServerRequest {
    pub service: String,
    pub ip: String,
    pub port: u16,
    pub check_type: CheckType,
    /// Sent only for HTTP checks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_path: Option<String>,
}

/// Partial update for a server identified by `(service, ip, port)`.
#[derive(Debug, Clone, Serialize)]
pub struct EditServerRequest {
    pub service: String,
    pub ip: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_type: Option<CheckType>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoveServerRequest {
    pub service: String,
    pub ip: String,
    pub port: u16,
}

// ── Dashboard state store ──
//
// Single owner of the canonical model: connectivity, the
// services+status pair, the log buffer, and the current operation
// error. Every mutation goes through this store; consumers read
// snapshots or subscribe to watch channels. The services list and the
// status map live in one watch value so they can only ever be replaced
// together.

use std::sync::{Arc, RwLock};

use tokio::sync::watch;

use lbdash_api::{Mode, Service, StatusMap};

// ── Connectivity ─────────────────────────────────────────────────────

/// Backend reachability as observed by the controller.
/// Exactly one state holds at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    /// Startup: no probe has completed yet.
    Probing,
    /// The most recent probe or refresh failed.
    Unavailable,
    /// The most recent probe or refresh succeeded.
    Available,
}

// ── Operation errors ─────────────────────────────────────────────────

/// Which operation produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ErrorScope {
    #[strum(serialize = "probe")]
    Probe,
    #[strum(serialize = "refresh")]
    Refresh,
    #[strum(serialize = "log stream")]
    Stream,
    #[strum(serialize = "set mode")]
    SetMode,
    #[strum(serialize = "add service")]
    AddService,
    #[strum(serialize = "edit service")]
    EditService,
    #[strum(serialize = "remove service")]
    RemoveService,
    #[strum(serialize = "add server")]
    AddServer,
    #[strum(serialize = "edit server")]
    EditServer,
    #[strum(serialize = "remove server")]
    RemoveServer,
}

/// A surfaced failure, shown until the next successful operation or an
/// explicit dismissal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationError {
    pub scope: ErrorScope,
    pub message: String,
}

impl std::fmt::Display for OperationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.scope, self.message)
    }
}

// ── Service view ─────────────────────────────────────────────────────

/// The atomic pair: service list and health-status map from one
/// successful refresh. Never updated field-by-field (the optimistic
/// mode change is the single sanctioned exception).
#[derive(Debug, Clone, Default)]
pub struct ServiceView {
    pub services: Vec<Service>,
    pub status: StatusMap,
}

/// A coherent read of every store field.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub connectivity: ConnectivityState,
    pub view: Arc<ServiceView>,
    pub logs: Vec<String>,
    pub last_error: Option<OperationError>,
}

// ── Store ────────────────────────────────────────────────────────────

/// Reactive storage for the dashboard model.
///
/// Watch channels give push-based change notification; the log buffer
/// sits behind an `RwLock` with a version channel so appends don't
/// re-clone the whole buffer per subscriber.
pub struct DashboardStore {
    connectivity: watch::Sender<ConnectivityState>,
    data: watch::Sender<Arc<ServiceView>>,
    logs: RwLock<Vec<String>>,
    log_version: watch::Sender<u64>,
    error: watch::Sender<Option<OperationError>>,
}

impl Default for DashboardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardStore {
    pub fn new() -> Self {
        let (connectivity, _) = watch::channel(ConnectivityState::Probing);
        let (data, _) = watch::channel(Arc::new(ServiceView::default()));
        let (log_version, _) = watch::channel(0u64);
        let (error, _) = watch::channel(None);

        Self {
            connectivity,
            data,
            logs: RwLock::new(Vec::new()),
            log_version,
            error,
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn connectivity(&self) -> ConnectivityState {
        *self.connectivity.borrow()
    }

    pub fn view(&self) -> Arc<ServiceView> {
        self.data.borrow().clone()
    }

    pub fn logs(&self) -> Vec<String> {
        self.logs.read().expect("log lock poisoned").clone()
    }

    pub fn last_error(&self) -> Option<OperationError> {
        self.error.borrow().clone()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            connectivity: self.connectivity(),
            view: self.view(),
            logs: self.logs(),
            last_error: self.last_error(),
        }
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_connectivity(&self) -> watch::Receiver<ConnectivityState> {
        self.connectivity.subscribe()
    }

    pub fn subscribe_view(&self) -> watch::Receiver<Arc<ServiceView>> {
        self.data.subscribe()
    }

    /// Bumped once per appended line and once per clear.
    pub fn subscribe_log_version(&self) -> watch::Receiver<u64> {
        self.log_version.subscribe()
    }

    pub fn subscribe_error(&self) -> watch::Receiver<Option<OperationError>> {
        self.error.subscribe()
    }

    // ── Writes (controller only) ─────────────────────────────────────

    /// Transition connectivity. Subscribers are only notified on an
    /// actual change.
    pub fn set_connectivity(&self, state: ConnectivityState) {
        self.connectivity.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }

    /// Commit a refresh result: both halves replaced together.
    pub fn replace_services_and_status(&self, services: Vec<Service>, status: StatusMap) {
        self.data
            .send_modify(|view| *view = Arc::new(ServiceView { services, status }));
    }

    /// Optimistic single-field update for the mode toggle. Returns
    /// `false` if the service is unknown locally (nothing changes).
    /// The next refresh overwrites this either way.
    pub fn apply_optimistic_mode(&self, service: &str, mode: Mode) -> bool {
        let mut found = false;
        self.data.send_if_modified(|view| {
            let Some(pos) = view.services.iter().position(|s| s.name == service) else {
                return false;
            };
            found = true;
            if view.services[pos].mode == mode {
                return false;
            }
            let mut next = (**view).clone();
            next.services[pos].mode = mode;
            *view = Arc::new(next);
            true
        });
        found
    }

    /// Append one raw stream line. The buffer only ever grows here.
    pub fn append_log(&self, line: String) {
        self.logs.write().expect("log lock poisoned").push(line);
        self.log_version.send_modify(|v| *v += 1);
    }

    /// Explicit operator-initiated clear — the only way the buffer shrinks.
    pub fn clear_logs(&self) {
        self.logs.write().expect("log lock poisoned").clear();
        self.log_version.send_modify(|v| *v += 1);
    }

    pub fn set_error(&self, scope: ErrorScope, message: impl Into<String>) {
        // send_replace, not send: the value must stick even when no
        // subscriber is currently listening.
        self.error.send_replace(Some(OperationError {
            scope,
            message: message.into(),
        }));
    }

    /// Dismiss the current error (or record a successful operation).
    pub fn clear_error(&self) {
        self.error.send_if_modified(|current| current.take().is_some());
    }

    /// Clear the error only if it belongs to `scope` — used by the
    /// stream bridge so a reconnect doesn't wipe an unrelated banner.
    pub fn clear_error_scoped(&self, scope: ErrorScope) {
        self.error.send_if_modified(|current| {
            if current.as_ref().is_some_and(|e| e.scope == scope) {
                *current = None;
                true
            } else {
                false
            }
        });
    }
}

// ── Connection controller ──
//
// Full lifecycle management for the backend connection: availability
// probing, periodic and on-demand refresh, the log-stream bridge, and
// the mutation gateway. All state lands in the DashboardStore; the
// presentation layer only reads from there.

use std::sync::Arc;

use tokio::sync::{Mutex, Notify, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use lbdash_api::{
    ApiClient, CheckType, EditServerRequest, EditServiceRequest, LogStreamEvent, LogStreamHandle,
    Mode, ReconnectPolicy, add_server_request,
};

use crate::config::ControllerConfig;
use crate::confirm::ConfirmGate;
use crate::error::CoreError;
use crate::store::{ConnectivityState, DashboardStore, ErrorScope};
use crate::task::{self, Schedule, TimerHandle};

// ── MutationOutcome ──────────────────────────────────────────────────

/// Result of a gateway mutation that completed without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The backend accepted the operation and a reconciling refresh ran.
    Applied,
    /// The confirmation gate declined — no request was sent, nothing
    /// changed.
    Declined,
}

// ── Controller ───────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. [`start`](Self::start)
/// spawns the supervisor (probe loop, refresh timer, stream bridge);
/// the mutation methods work with or without the supervisor running.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    api: ApiClient,
    store: Arc<DashboardStore>,
    confirm: Arc<dyn ConfirmGate>,
    cancel: CancellationToken,
    /// Short-circuits the probe sleep (the UI's retry affordance).
    retry: Notify,
    /// Serializes refreshes: a manual refresh overlapping the timer
    /// waits instead of racing the commit.
    refresh_lock: Mutex<()>,
    refresh_timer: Mutex<Option<TimerHandle>>,
    stream: Mutex<Option<LogStreamHandle>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Controller {
    /// Build a controller. Does not touch the network — call
    /// [`start`](Self::start) for the live loop, or the individual
    /// operations for one-shot use.
    pub fn new(config: ControllerConfig, confirm: Arc<dyn ConfirmGate>) -> Result<Self, CoreError> {
        let api = ApiClient::new(config.base_url.clone(), config.request_timeout)?;
        Ok(Self {
            inner: Arc::new(ControllerInner {
                config,
                api,
                store: Arc::new(DashboardStore::new()),
                confirm,
                cancel: CancellationToken::new(),
                retry: Notify::new(),
                refresh_lock: Mutex::new(()),
                refresh_timer: Mutex::new(None),
                stream: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// The canonical read model.
    pub fn store(&self) -> &Arc<DashboardStore> {
        &self.inner.store
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Spawn the supervisor: probe until reachable, then refresh
    /// immediately, start the periodic refresh timer, and open the log
    /// stream. On any downgrade the timer stops and probing resumes.
    pub async fn start(&self) {
        let ctrl = self.clone();
        let cancel = self.inner.cancel.clone();
        let handle = tokio::spawn(async move {
            supervisor_task(ctrl, cancel).await;
        });
        self.inner.task_handles.lock().await.push(handle);
    }

    /// Tear everything down: refresh timer, pending stream reconnect,
    /// open stream connection, and all spawned tasks.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        self.stop_refresh_timer().await;
        if let Some(stream) = self.inner.stream.lock().await.take() {
            stream.shutdown();
        }
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!("controller shut down");
    }

    /// Skip the remainder of the current probe delay and retry now.
    pub fn retry_now(&self) {
        self.inner.retry.notify_one();
    }

    /// Dismiss the current operation error without waiting for the
    /// next successful operation.
    pub fn dismiss_error(&self) {
        self.inner.store.clear_error();
    }

    // ── Prober ───────────────────────────────────────────────────────

    /// Issue one health probe and write exactly one connectivity
    /// transition. Never propagates a failure — an unreachable backend
    /// is the `false` return plus a probe-scoped operation error.
    pub async fn probe_once(&self) -> bool {
        match self.inner.api.probe().await {
            Ok(()) => {
                self.inner.store.clear_error_scoped(ErrorScope::Probe);
                self.inner.store.set_connectivity(ConnectivityState::Available);
                true
            }
            Err(e) => {
                debug!(error = %e, "health probe failed");
                self.inner
                    .store
                    .set_error(ErrorScope::Probe, format!("backend unreachable: {e}"));
                self.inner
                    .store
                    .set_connectivity(ConnectivityState::Unavailable);
                false
            }
        }
    }

    // ── Refresh scheduler ────────────────────────────────────────────

    /// Fetch the service list and the status snapshot concurrently and
    /// commit them as an atomic pair.
    ///
    /// Both legs must succeed; a partial result commits nothing and
    /// downgrades connectivity to `Unavailable` — a backend that can
    /// only answer half the refresh is treated as lost, not as stale.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let _guard = self.inner.refresh_lock.lock().await;

        let (services_res, status_res) =
            tokio::join!(self.inner.api.list_services(), self.inner.api.status());

        match (services_res, status_res) {
            (Ok(services), Ok(status)) => {
                debug!(service_count = services.len(), "refresh committed");
                self.inner.store.replace_services_and_status(services, status);
                self.inner.store.clear_error();
                self.inner.store.set_connectivity(ConnectivityState::Available);
                Ok(())
            }
            (Err(e), _) | (Ok(_), Err(e)) => {
                warn!(error = %e, "refresh failed, marking backend unavailable");
                self.inner
                    .store
                    .set_error(ErrorScope::Refresh, format!("refresh failed: {e}"));
                self.inner
                    .store
                    .set_connectivity(ConnectivityState::Unavailable);
                Err(e.into())
            }
        }
    }

    async fn start_refresh_timer(&self) {
        let mut guard = self.inner.refresh_timer.lock().await;
        if guard.is_some() {
            return;
        }
        let ctrl = self.clone();
        let timer = task::spawn(
            Schedule::Every(self.inner.config.refresh_interval),
            &self.inner.cancel,
            move || {
                let ctrl = ctrl.clone();
                async move {
                    // A failed tick downgrades connectivity itself.
                    let _ = ctrl.refresh().await;
                }
            },
        );
        *guard = Some(timer);
    }

    async fn stop_refresh_timer(&self) {
        if let Some(timer) = self.inner.refresh_timer.lock().await.take() {
            timer.stop().await;
        }
    }

    // ── Log stream ───────────────────────────────────────────────────

    /// Ensure the log stream is connected. Idempotent: a live handle
    /// makes this a no-op ("ensure connected", never "force reconnect").
    pub async fn ensure_stream(&self) {
        if !self.inner.config.stream_enabled {
            return;
        }
        let mut guard = self.inner.stream.lock().await;
        if guard.is_some() {
            return;
        }
        let ws_url = match self.inner.api.ws_url() {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "invalid log stream URL");
                return;
            }
        };
        let handle = LogStreamHandle::connect(
            ws_url,
            ReconnectPolicy {
                delay: self.inner.config.reconnect_delay,
            },
            self.inner.cancel.child_token(),
        );
        let events = handle.subscribe();
        *guard = Some(handle);
        drop(guard);

        let store = Arc::clone(&self.inner.store);
        let cancel = self.inner.cancel.clone();
        let bridge = tokio::spawn(async move {
            stream_bridge_task(store, events, cancel).await;
        });
        self.inner.task_handles.lock().await.push(bridge);
    }

    // ── Mutation gateway ─────────────────────────────────────────────

    /// Change a service's distribution mode.
    ///
    /// Applies the optimistic single-field update before the request so
    /// the control reflects the change immediately; the next refresh
    /// reconciles (there is no automatic rollback on failure).
    pub async fn set_mode(&self, service: &str, mode: Mode) -> Result<MutationOutcome, CoreError> {
        self.require_name(ErrorScope::SetMode, service)?;

        self.inner.store.apply_optimistic_mode(service, mode);
        match self.inner.api.set_mode(service, mode).await {
            Ok(_) => self.reconcile().await,
            Err(e) => Err(self.record_failure(ErrorScope::SetMode, e)),
        }
    }

    pub async fn add_service(
        &self,
        name: &str,
        listen_port: u16,
        mode: Mode,
    ) -> Result<MutationOutcome, CoreError> {
        self.require_name(ErrorScope::AddService, name)?;
        self.require_port(ErrorScope::AddService, listen_port)?;

        match self.inner.api.add_service(name, listen_port, mode).await {
            Ok(_) => self.reconcile().await,
            Err(e) => Err(self.record_failure(ErrorScope::AddService, e)),
        }
    }

    /// Partial service update: unset fields are left unchanged
    /// server-side.
    pub async fn edit_service(
        &self,
        req: &EditServiceRequest,
    ) -> Result<MutationOutcome, CoreError> {
        self.require_name(ErrorScope::EditService, &req.name)?;
        if let Some(ref new_name) = req.new_name {
            self.require_name(ErrorScope::EditService, new_name)?;
        }
        if let Some(port) = req.listen_port {
            self.require_port(ErrorScope::EditService, port)?;
        }

        match self.inner.api.edit_service(req).await {
            Ok(_) => self.reconcile().await,
            Err(e) => Err(self.record_failure(ErrorScope::EditService, e)),
        }
    }

    /// Destructive — consults the confirmation gate before any request.
    pub async fn remove_service(&self, name: &str) -> Result<MutationOutcome, CoreError> {
        self.require_name(ErrorScope::RemoveService, name)?;
        if !self
            .inner
            .confirm
            .confirm(&format!("Remove service '{name}' and all its servers?"))
        {
            info!(service = name, "service removal declined");
            return Ok(MutationOutcome::Declined);
        }

        match self.inner.api.remove_service(name).await {
            Ok(_) => self.reconcile().await,
            Err(e) => Err(self.record_failure(ErrorScope::RemoveService, e)),
        }
    }

    /// Add a backend server to a service. `http_path` is forwarded only
    /// for HTTP checks.
    pub async fn add_server(
        &self,
        service: &str,
        ip: &str,
        port: u16,
        check_type: CheckType,
        http_path: Option<String>,
    ) -> Result<MutationOutcome, CoreError> {
        self.require_name(ErrorScope::AddServer, service)?;
        self.require_name(ErrorScope::AddServer, ip)?;
        self.require_port(ErrorScope::AddServer, port)?;

        let req = add_server_request(service, ip, port, check_type, http_path);
        match self.inner.api.add_server(&req).await {
            Ok(_) => self.reconcile().await,
            Err(e) => Err(self.record_failure(ErrorScope::AddServer, e)),
        }
    }

    /// Partial server update, identified by `(service, ip, port)`.
    pub async fn edit_server(&self, req: &EditServerRequest) -> Result<MutationOutcome, CoreError> {
        self.require_name(ErrorScope::EditServer, &req.service)?;
        self.require_name(ErrorScope::EditServer, &req.ip)?;
        self.require_port(ErrorScope::EditServer, req.port)?;
        if let Some(ref new_ip) = req.new_ip {
            self.require_name(ErrorScope::EditServer, new_ip)?;
        }
        if let Some(new_port) = req.new_port {
            self.require_port(ErrorScope::EditServer, new_port)?;
        }

        match self.inner.api.edit_server(req).await {
            Ok(_) => self.reconcile().await,
            Err(e) => Err(self.record_failure(ErrorScope::EditServer, e)),
        }
    }

    /// Destructive — consults the confirmation gate before any request.
    pub async fn remove_server(
        &self,
        service: &str,
        ip: &str,
        port: u16,
    ) -> Result<MutationOutcome, CoreError> {
        self.require_name(ErrorScope::RemoveServer, service)?;
        self.require_name(ErrorScope::RemoveServer, ip)?;
        self.require_port(ErrorScope::RemoveServer, port)?;
        if !self.inner.confirm.confirm(&format!(
            "Remove server {ip}:{port} from service '{service}'?"
        )) {
            info!(service, ip, port, "server removal declined");
            return Ok(MutationOutcome::Declined);
        }

        match self.inner.api.remove_server(service, ip, port).await {
            Ok(_) => self.reconcile().await,
            Err(e) => Err(self.record_failure(ErrorScope::RemoveServer, e)),
        }
    }

    // ── Gateway helpers ──────────────────────────────────────────────

    /// Post-mutation reconciliation: clear the error banner, then pull
    /// authoritative state. Refresh failures record their own state.
    async fn reconcile(&self) -> Result<MutationOutcome, CoreError> {
        self.inner.store.clear_error();
        let _ = self.refresh().await;
        Ok(MutationOutcome::Applied)
    }

    /// Record a backend failure against its scope: the backend's reason
    /// string when it supplied one, else a generic scoped message.
    fn record_failure(&self, scope: ErrorScope, e: lbdash_api::Error) -> CoreError {
        let message = e
            .backend_message()
            .map_or_else(|| format!("{scope} failed: {e}"), str::to_owned);
        self.inner.store.set_error(scope, message);
        CoreError::Api(e)
    }

    fn require_name(&self, scope: ErrorScope, name: &str) -> Result<(), CoreError> {
        if name.trim().is_empty() {
            self.inner.store.set_error(scope, CoreError::EmptyName.to_string());
            return Err(CoreError::EmptyName);
        }
        Ok(())
    }

    fn require_port(&self, scope: ErrorScope, port: u16) -> Result<(), CoreError> {
        if port == 0 {
            self.inner.store.set_error(scope, CoreError::InvalidPort.to_string());
            return Err(CoreError::InvalidPort);
        }
        Ok(())
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Probe until reachable, hand off to the refresh timer and the log
/// stream, park until downgraded, repeat.
async fn supervisor_task(ctrl: Controller, cancel: CancellationToken) {
    let mut conn_rx = ctrl.inner.store.subscribe_connectivity();

    loop {
        // Probe phase: 5s cadence (or a manual retry) until reachable.
        loop {
            if cancel.is_cancelled() {
                return;
            }
            if ctrl.probe_once().await {
                break;
            }
            tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                () = ctrl.inner.retry.notified() => {}
                () = tokio::time::sleep(ctrl.inner.config.probe_interval) => {}
            }
        }

        // Reachable: initial snapshot. A failure here downgraded the
        // state already — go straight back to probing.
        if ctrl.refresh().await.is_err() {
            continue;
        }
        ctrl.start_refresh_timer().await;
        ctrl.ensure_stream().await;
        info!("backend available");

        // Park until a refresh failure (or anything else) drives the
        // state out of Available.
        let downgraded = tokio::select! {
            biased;
            () = cancel.cancelled() => false,
            res = conn_rx.wait_for(|s| *s != ConnectivityState::Available) => res.is_ok(),
        };
        ctrl.stop_refresh_timer().await;
        if !downgraded {
            return;
        }
        info!("backend unavailable, resuming probe cadence");
    }
}

/// Forward stream events into the store: lines append verbatim, opens
/// clear the stream-scoped error, closes record one.
async fn stream_bridge_task(
    store: Arc<DashboardStore>,
    mut events: broadcast::Receiver<Arc<LogStreamEvent>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = events.recv() => match event {
                Ok(event) => match event.as_ref() {
                    LogStreamEvent::Opened => {
                        store.clear_error_scoped(ErrorScope::Stream);
                    }
                    LogStreamEvent::Line(line) => {
                        store.append_log(line.clone());
                    }
                    LogStreamEvent::Closed { reason } => {
                        let message = reason
                            .clone()
                            .unwrap_or_else(|| "log stream disconnected".to_owned());
                        store.set_error(ErrorScope::Stream, message);
                    }
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "log consumer lagged, stream lines dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

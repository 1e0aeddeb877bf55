//! Controller integration tests against a mocked backend.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lbdash_core::{
    AssumeYes, ConnectivityState, Controller, ControllerConfig, CoreError, DenyAll, ErrorScope,
    MutationOutcome,
};

fn test_config(server: &MockServer) -> ControllerConfig {
    let mut config = ControllerConfig::new(Url::parse(&server.uri()).unwrap());
    config.probe_interval = Duration::from_millis(50);
    config.refresh_interval = Duration::from_millis(200);
    config.stream_enabled = false;
    config
}

fn controller(server: &MockServer) -> Controller {
    Controller::new(test_config(server), Arc::new(AssumeYes)).unwrap()
}

fn web_service(mode: &str) -> serde_json::Value {
    json!({
        "name": "web",
        "listen_port": 8080,
        "mode": mode,
        "servers": [
            {"ip": "10.0.0.5", "port": 8080, "check_type": "http", "http_path": "/health"}
        ]
    })
}

async fn mount_health(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(server)
        .await;
}

async fn mount_snapshot(server: &MockServer, services: serde_json::Value, status: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/list_services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"services": services})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"services": status})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn supervisor_probes_then_publishes_empty_snapshot() {
    let server = MockServer::start().await;
    mount_health(&server).await;
    mount_snapshot(&server, json!([]), json!({})).await;

    let ctrl = controller(&server);
    let mut conn = ctrl.store().subscribe_connectivity();
    ctrl.start().await;

    tokio::time::timeout(
        Duration::from_secs(5),
        conn.wait_for(|s| *s == ConnectivityState::Available),
    )
    .await
    .expect("backend never became available")
    .unwrap();

    let snap = ctrl.store().snapshot();
    assert!(snap.view.services.is_empty());
    assert!(snap.view.status.is_empty());
    assert!(snap.last_error.is_none());

    ctrl.shutdown().await;
}

#[tokio::test]
async fn probe_failure_marks_unavailable_with_scoped_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let ctrl = controller(&server);
    assert!(!ctrl.probe_once().await);

    let snap = ctrl.store().snapshot();
    assert_eq!(snap.connectivity, ConnectivityState::Unavailable);
    let err = snap.last_error.unwrap();
    assert_eq!(err.scope, ErrorScope::Probe);
}

#[tokio::test]
async fn retry_now_short_circuits_probe_delay() {
    let server = MockServer::start().await;
    // First probe fails; every later one succeeds.
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_health(&server).await;
    mount_snapshot(&server, json!([]), json!({})).await;

    let server_config = {
        let mut config = test_config(&server);
        // Long enough that only a manual retry can get us there in time.
        config.probe_interval = Duration::from_secs(60);
        config
    };
    let ctrl = Controller::new(server_config, Arc::new(AssumeYes)).unwrap();
    let mut conn = ctrl.store().subscribe_connectivity();
    ctrl.start().await;

    tokio::time::timeout(
        Duration::from_secs(5),
        conn.wait_for(|s| *s == ConnectivityState::Unavailable),
    )
    .await
    .expect("first probe never failed")
    .unwrap();

    ctrl.retry_now();
    tokio::time::timeout(
        Duration::from_secs(5),
        conn.wait_for(|s| *s == ConnectivityState::Available),
    )
    .await
    .expect("manual retry did not reconnect")
    .unwrap();

    ctrl.shutdown().await;
}

#[tokio::test]
async fn partial_refresh_failure_keeps_previous_pair_and_downgrades() {
    let server = MockServer::start().await;
    // The service list answers once, then starts failing; status keeps
    // answering. A half-successful refresh must commit nothing.
    Mock::given(method("GET"))
        .and(path("/api/list_services"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"services": [web_service("failover")]})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"services": {"web": {"10.0.0.5:8080 (http)": "🟢 UP"}}}),
        ))
        .mount(&server)
        .await;

    let ctrl = controller(&server);
    ctrl.refresh().await.unwrap();
    assert_eq!(ctrl.store().view().services.len(), 1);

    assert!(ctrl.refresh().await.is_err());

    let snap = ctrl.store().snapshot();
    assert_eq!(snap.connectivity, ConnectivityState::Unavailable);
    assert_eq!(snap.view.services.len(), 1, "previous pair must survive");
    assert_eq!(
        snap.view.status["web"]["10.0.0.5:8080 (http)"], "🟢 UP",
        "previous status must survive"
    );
    assert_eq!(snap.last_error.unwrap().scope, ErrorScope::Refresh);
}

#[tokio::test]
async fn manual_refresh_leaves_periodic_cadence_alone() {
    let server = MockServer::start().await;
    mount_health(&server).await;
    mount_snapshot(&server, json!([]), json!({})).await;

    let config = {
        let mut config = test_config(&server);
        config.refresh_interval = Duration::from_millis(400);
        config
    };
    let ctrl = Controller::new(config, Arc::new(AssumeYes)).unwrap();
    let mut conn = ctrl.store().subscribe_connectivity();
    ctrl.start().await;

    tokio::time::timeout(
        Duration::from_secs(5),
        conn.wait_for(|s| *s == ConnectivityState::Available),
    )
    .await
    .expect("backend never became available")
    .unwrap();

    // Initial refresh done; let the first periodic tick land, then
    // refresh manually mid-interval.
    tokio::time::sleep(Duration::from_millis(600)).await;
    ctrl.refresh().await.unwrap();

    // The next periodic tick is still due at the original schedule
    // (~800ms), not pushed out by the manual refresh.
    tokio::time::sleep(Duration::from_millis(350)).await;

    let list_calls = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/api/list_services")
        .count();
    assert!(
        list_calls >= 4,
        "expected initial + two periodic + one manual refresh, saw {list_calls}"
    );

    ctrl.shutdown().await;
}

#[tokio::test]
async fn mutation_success_triggers_reconciling_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/add_service"))
        .and(body_json(json!({"name": "web", "listen_port": 8080, "mode": "failover"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Service added"})))
        .expect(1)
        .mount(&server)
        .await;
    mount_snapshot(
        &server,
        json!([web_service("failover")]),
        json!({"web": {"10.0.0.5:8080 (http)": "🔴 DOWN"}}),
    )
    .await;

    let ctrl = controller(&server);
    let outcome = ctrl
        .add_service("web", 8080, lbdash_api::Mode::Failover)
        .await
        .unwrap();
    assert_eq!(outcome, MutationOutcome::Applied);

    // The post-mutation refresh already ran by the time the call returns.
    let snap = ctrl.store().snapshot();
    assert_eq!(snap.view.services.len(), 1);
    assert_eq!(snap.view.services[0].name, "web");
    assert!(snap.last_error.is_none());
    assert_eq!(snap.connectivity, ConnectivityState::Available);
}

#[tokio::test]
async fn declined_confirmation_sends_zero_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/remove_service"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "removed"})))
        .expect(0)
        .mount(&server)
        .await;

    let gate = Arc::new(DenyAll::default());
    let gate_dyn: Arc<dyn lbdash_core::ConfirmGate> = Arc::clone(&gate) as _;
    let ctrl = Controller::new(test_config(&server), gate_dyn).unwrap();

    let outcome = ctrl.remove_service("web").await.unwrap();
    assert_eq!(outcome, MutationOutcome::Declined);
    assert_eq!(gate.asked(), 1);

    // Nothing changed: no error, no connectivity transition.
    let snap = ctrl.store().snapshot();
    assert_eq!(snap.connectivity, ConnectivityState::Probing);
    assert!(snap.last_error.is_none());
}

#[tokio::test]
async fn backend_rejection_surfaces_detail_without_touching_connectivity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/add_service"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"detail": "Service group already exists"})),
        )
        .mount(&server)
        .await;

    let ctrl = controller(&server);
    let err = ctrl
        .add_service("web", 8080, lbdash_api::Mode::Failover)
        .await
        .unwrap_err();
    assert_eq!(err.backend_message(), Some("Service group already exists"));

    let snap = ctrl.store().snapshot();
    let op_err = snap.last_error.unwrap();
    assert_eq!(op_err.scope, ErrorScope::AddService);
    assert_eq!(op_err.message, "Service group already exists");
    assert_eq!(
        snap.connectivity,
        ConnectivityState::Probing,
        "a rejected mutation says nothing about reachability"
    );
}

#[tokio::test]
async fn failed_set_mode_keeps_optimistic_value_until_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/set_mode"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let ctrl = controller(&server);
    // Seed the local view the way a refresh would have.
    let services: Vec<lbdash_api::Service> =
        serde_json::from_value(json!([web_service("failover")])).unwrap();
    ctrl.store()
        .replace_services_and_status(services, lbdash_api::StatusMap::new());

    let err = ctrl.set_mode("web", lbdash_api::Mode::RoundRobin).await;
    assert!(err.is_err());

    // No rollback: the optimistic value stands until a refresh reconciles.
    assert_eq!(
        ctrl.store().view().services[0].mode,
        lbdash_api::Mode::RoundRobin
    );
    assert_eq!(
        ctrl.store().last_error().unwrap().scope,
        ErrorScope::SetMode
    );
}

#[tokio::test]
async fn successful_set_mode_is_reconciled_by_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/set_mode"))
        .and(body_json(json!({"service": "web", "mode": "round-robin"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "mode set"})))
        .expect(1)
        .mount(&server)
        .await;
    // Backend reports failover: its answer wins over the optimistic value.
    mount_snapshot(&server, json!([web_service("failover")]), json!({})).await;

    let ctrl = controller(&server);
    let services: Vec<lbdash_api::Service> =
        serde_json::from_value(json!([web_service("failover")])).unwrap();
    ctrl.store()
        .replace_services_and_status(services, lbdash_api::StatusMap::new());

    let outcome = ctrl
        .set_mode("web", lbdash_api::Mode::RoundRobin)
        .await
        .unwrap();
    assert_eq!(outcome, MutationOutcome::Applied);
    assert_eq!(
        ctrl.store().view().services[0].mode,
        lbdash_api::Mode::Failover
    );
}

#[tokio::test]
async fn local_validation_rejects_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .expect(0)
        .mount(&server)
        .await;

    let ctrl = controller(&server);

    let err = ctrl
        .add_service("  ", 8080, lbdash_api::Mode::Failover)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::EmptyName));
    assert_eq!(
        ctrl.store().last_error().unwrap().scope,
        ErrorScope::AddService
    );

    let err = ctrl
        .add_server("web", "10.0.0.5", 0, lbdash_api::CheckType::Tcp, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidPort));
    assert_eq!(
        ctrl.store().last_error().unwrap().scope,
        ErrorScope::AddServer
    );
}

#[tokio::test]
async fn remove_server_posts_identity_and_refreshes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/remove_server"))
        .and(body_json(json!({"service": "web", "ip": "10.0.0.5", "port": 8080})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Server removed"})))
        .expect(1)
        .mount(&server)
        .await;
    mount_snapshot(&server, json!([]), json!({})).await;

    let ctrl = controller(&server);
    let outcome = ctrl.remove_server("web", "10.0.0.5", 8080).await.unwrap();
    assert_eq!(outcome, MutationOutcome::Applied);
    assert!(ctrl.store().view().services.is_empty());
}

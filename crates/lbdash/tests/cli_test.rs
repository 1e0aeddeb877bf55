//! Integration tests for the `lbdash` CLI binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! and error handling — all without requiring a live backend.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `lbdash` binary with env isolation.
///
/// Clears all `LBDASH_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn lbdash_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("lbdash");
    cmd.env("HOME", "/tmp/lbdash-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/lbdash-cli-test-nonexistent")
        .env_remove("LBDASH_PROFILE")
        .env_remove("LBDASH_BACKEND")
        .env_remove("LBDASH_OUTPUT")
        .env_remove("LBDASH_TIMEOUT");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = lbdash_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    lbdash_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("load-balancer")
            .and(predicate::str::contains("status"))
            .and(predicate::str::contains("services"))
            .and(predicate::str::contains("servers"))
            .and(predicate::str::contains("logs")),
    );
}

#[test]
fn test_version_flag() {
    lbdash_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("lbdash"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    lbdash_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    lbdash_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = lbdash_cmd().arg("foobar").output().unwrap();
    assert!(
        !output.status.success(),
        "Expected failure for invalid subcommand"
    );
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_status_no_backend_configured() {
    lbdash_cmd()
        .arg("status")
        .assert()
        .failure()
        .code(2)
        .stderr(
            predicate::str::contains("backend")
                .or(predicate::str::contains("Backend"))
                .or(predicate::str::contains("config")),
        );
}

#[test]
fn test_status_unreachable_backend_exit_code() {
    // Port 1 refuses immediately; no service listens there.
    let output = lbdash_cmd()
        .args(["status", "--backend", "http://127.0.0.1:1"])
        .output()
        .unwrap();
    assert_eq!(
        output.status.code(),
        Some(7),
        "connection failures map to exit code 7:\n{}",
        combined_output(&output)
    );
}

#[test]
fn test_invalid_backend_url() {
    lbdash_cmd()
        .args(["status", "--backend", "not a url"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid URL").or(predicate::str::contains("backend")));
}

#[test]
fn test_invalid_output_format() {
    let output = lbdash_cmd()
        .args(["--output", "invalid", "status"])
        .output()
        .unwrap();
    assert!(
        !output.status.success(),
        "Expected failure for invalid output format"
    );
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("possible values") || text.contains("valid value"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_global_flags_parsing() {
    // All flags should parse correctly — the failure should be about
    // the missing backend config, not about argument parsing.
    lbdash_cmd()
        .args([
            "--output", "json", "--verbose", "--yes", "--timeout", "3", "services", "list",
        ])
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("backend")
                .or(predicate::str::contains("Backend"))
                .or(predicate::str::contains("config")),
        );
}

#[test]
fn test_mode_requires_arguments() {
    let output = lbdash_cmd().arg("mode").output().unwrap();
    assert!(!output.status.success(), "Expected failure without args");
    let text = combined_output(&output);
    assert!(
        text.contains("required") || text.contains("Usage"),
        "Expected usage error:\n{text}"
    );
}

#[test]
fn test_mode_rejects_unknown_mode() {
    let output = lbdash_cmd().args(["mode", "web", "sticky"]).output().unwrap();
    assert!(!output.status.success(), "Expected failure for bad mode");
    let text = combined_output(&output);
    assert!(
        text.contains("possible values") || text.contains("invalid"),
        "Expected valid-values error:\n{text}"
    );
}

// ── Subcommand help discovery ───────────────────────────────────────

#[test]
fn test_services_subcommands_exist() {
    lbdash_cmd()
        .args(["services", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("list")
                .and(predicate::str::contains("add"))
                .and(predicate::str::contains("edit"))
                .and(predicate::str::contains("remove")),
        );
}

#[test]
fn test_servers_subcommands_exist() {
    lbdash_cmd()
        .args(["servers", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("list")
                .and(predicate::str::contains("add"))
                .and(predicate::str::contains("edit"))
                .and(predicate::str::contains("remove")),
        );
}

#[test]
fn test_config_subcommands_exist() {
    lbdash_cmd()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("show")
                .and(predicate::str::contains("path"))
                .and(predicate::str::contains("init")),
        );
}

#[test]
fn test_config_path_prints_location() {
    lbdash_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_init_then_show() {
    let dir = tempfile::tempdir().unwrap();

    let mut init = cargo_bin_cmd!("lbdash");
    init.env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path())
        .env_remove("LBDASH_PROFILE")
        .env_remove("LBDASH_BACKEND");
    init.args(["config", "init", "http://10.1.2.3:5000"])
        .assert()
        .success();

    let mut show = cargo_bin_cmd!("lbdash");
    show.env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path())
        .env_remove("LBDASH_PROFILE")
        .env_remove("LBDASH_BACKEND");
    show.args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://10.1.2.3:5000"));
}

// ── End-to-end against a mocked backend ─────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_status_renders_mock_backend_health() {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/list_services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "services": [{
                "name": "web",
                "listen_port": 8080,
                "mode": "round-robin",
                "servers": [
                    {"ip": "10.0.0.5", "port": 8080, "check_type": "tcp", "http_path": null}
                ]
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "services": {"web": {"10.0.0.5:8080 (tcp)": "🟢 UP"}}
        })))
        .mount(&server)
        .await;

    let uri = server.uri();
    // assert_cmd blocks, so keep it off the runtime worker threads.
    tokio::task::spawn_blocking(move || {
        // Plain output: rows on stdout, the connectivity line on stderr.
        lbdash_cmd()
            .args(["status", "--backend", &uri, "--output", "plain", "--color", "never"])
            .assert()
            .success()
            .stdout(
                predicate::str::contains("web")
                    .and(predicate::str::contains("10.0.0.5:8080"))
                    .and(predicate::str::contains("UP")),
            )
            .stderr(predicate::str::contains("backend: available"));

        // Table output carries the connectivity banner on stdout.
        lbdash_cmd()
            .args(["status", "--backend", &uri, "--color", "never"])
            .assert()
            .success()
            .stdout(
                predicate::str::contains("== backend: available ==")
                    .and(predicate::str::contains("10.0.0.5:8080")),
            );
    })
    .await
    .unwrap();
}

#[test]
fn test_config_show_no_config() {
    // `config show` renders the default config when no file exists.
    lbdash_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default_profile"));
}

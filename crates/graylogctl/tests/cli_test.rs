//! Integration tests for the `graylogctl` binary.
//!
//! Argument parsing, the Nagios output contract and a few server-bound
//! commands run against a wiremock server; nothing touches a real Graylog.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// `graylogctl` with every `GRAYLOG_*` variable cleared and config
/// directories pointed at a nonexistent path.
fn graylogctl() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("graylogctl");
    cmd.env("HOME", "/tmp/graylogctl-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/graylogctl-test-nonexistent")
        .env_remove("GRAYLOG_PROFILE")
        .env_remove("GRAYLOG_HOST")
        .env_remove("GRAYLOG_PORT")
        .env_remove("GRAYLOG_USERNAME")
        .env_remove("GRAYLOG_PASSWORD")
        .env_remove("GRAYLOG_INSECURE")
        .env_remove("GRAYLOG_TIMEOUT")
        .env_remove("GRAYLOG_OUTPUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Connection flags for a mock server.
fn server_args(server: &MockServer) -> Vec<String> {
    let port = server.address().port().to_string();
    vec![
        "-h".into(),
        "127.0.0.1".into(),
        "-p".into(),
        port,
        "-u".into(),
        "admin".into(),
        "-P".into(),
        "secret".into(),
    ]
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run(args: Vec<String>) -> std::process::Output {
    tokio::task::spawn_blocking(move || graylogctl().args(args).output().unwrap())
        .await
        .unwrap()
}

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = graylogctl().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = format!(
        "{}{}",
        stdout(&output),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(text.contains("Usage"), "expected usage text:\n{text}");
}

#[test]
fn test_help_flag() {
    graylogctl().arg("--help").assert().success().stdout(
        predicate::str::contains("Graylog")
            .and(predicate::str::contains("check"))
            .and(predicate::str::contains("control"))
            .and(predicate::str::contains("streams")),
    );
}

#[test]
fn test_version_flag() {
    graylogctl()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("graylogctl"));
}

#[test]
fn test_completions_bash() {
    graylogctl()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_unknown_check_target_is_unknown() {
    graylogctl()
        .args(["check", "widgets"])
        .assert()
        .code(3)
        .stdout(
            predicate::str::starts_with("UNKNOWN - ")
                .and(predicate::str::contains("widgets"))
                .and(predicate::str::ends_with("\n"))
                .and(predicate::str::contains("\n\n").not()),
        );
}

#[test]
fn test_unparsable_port_on_check_is_unknown() {
    graylogctl()
        .args(["-p", "notaport", "check", "inputs"])
        .assert()
        .code(3)
        .stdout(
            predicate::str::starts_with("UNKNOWN - ")
                .and(predicate::str::contains("notaport")),
        );
}

#[test]
fn test_unknown_control_flag_is_unknown() {
    graylogctl()
        .args(["control", "stream", "--bogus"])
        .assert()
        .code(3)
        .stdout(predicate::str::starts_with("UNKNOWN - "));
}

#[test]
fn test_bad_args_outside_nagios_keep_usage_exit() {
    graylogctl()
        .args(["streams", "explode"])
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_check_help_still_succeeds() {
    graylogctl()
        .args(["check", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("inputs"));
}

// ── Nagios argument validation ──────────────────────────────────────

#[test]
fn test_check_without_host() {
    graylogctl()
        .args(["check", "inputs"])
        .assert()
        .code(3)
        .stdout("UNKNOWN - bad hostname given\n");
}

#[test]
fn test_check_with_port_zero() {
    graylogctl()
        .args(["-h", "localhost", "-p", "0", "check", "inputs"])
        .assert()
        .code(3)
        .stdout("UNKNOWN - bad port given\n");
}

#[test]
fn test_check_without_port_uses_default() {
    // No -p: the profile default port applies, so validation moves on to the user
    graylogctl()
        .args(["-h", "localhost", "check", "inputs"])
        .assert()
        .code(3)
        .stdout("UNKNOWN - bad user given\n");
}

#[test]
fn test_check_without_user() {
    graylogctl()
        .args(["-h", "localhost", "check", "streams"])
        .assert()
        .code(3)
        .stdout("UNKNOWN - bad user given\n");
}

#[test]
fn test_control_without_command() {
    graylogctl()
        .args(["-h", "localhost", "-u", "admin", "-P", "x"])
        .args(["control", "input", "-i", "abc"])
        .assert()
        .code(3)
        .stdout("UNKNOWN - bad command given\n");
}

#[test]
fn test_control_without_id() {
    graylogctl()
        .args(["-h", "localhost", "-u", "admin", "-P", "x"])
        .args(["control", "stream", "-c", "pause"])
        .assert()
        .code(3)
        .stdout("UNKNOWN - bad id given\n");
}

#[test]
fn test_control_bad_keyword_lists_choices() {
    graylogctl()
        .args(["-h", "localhost", "-u", "admin", "-P", "x"])
        .args(["control", "input", "-i", "abc", "-c", "explode"])
        .assert()
        .code(3)
        .stdout(
            predicate::str::starts_with("UNKNOWN - ")
                .and(predicate::str::contains("bad keyword 'explode'"))
                .and(predicate::str::contains("launch, stop, restart")),
        );
}

#[test]
fn test_streams_without_host_points_at_config() {
    let output = graylogctl().args(["streams", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("config"));
}

// ── Against a mock server ───────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_check_inputs_reports_stopped_inputs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/system/inputs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "inputs": [
                { "id": "i1", "state": "RUNNING", "message_input": { "title": "syslog" } },
                { "id": "i2", "state": "FAILED", "message_input": { "title": "gelf" } },
            ],
            "total": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut args = server_args(&server);
    args.extend(["check".into(), "inputs".into()]);
    let output = run(args).await;

    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stdout(&output), "CRITICAL - gelf\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_check_streams_all_enabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/streams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "streams": [{ "id": "s1", "title": "FOO - bar", "disabled": false }],
            "total": 1
        })))
        .mount(&server)
        .await;

    let mut args = server_args(&server);
    args.extend(["check".into(), "streams".into()]);
    let output = run(args).await;

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "OK - all streams enabled\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_check_server_error_is_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/streams"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut args = server_args(&server);
    args.extend(["check".into(), "streams".into()]);
    let output = run(args).await;

    assert_eq!(output.status.code(), Some(3));
    assert!(stdout(&output).starts_with("UNKNOWN - failed to retrieve data"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_control_stream_pause() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/streams/s1/pause"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut args = server_args(&server);
    args.extend(
        ["control", "stream", "-i", "s1", "-c", "pause"]
            .into_iter()
            .map(String::from),
    );
    let output = run(args).await;

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "OK - action pause on stream s1 succeeded\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_streams_find_prints_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/streams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "streams": [
                { "id": "s1", "title": "FOO - bar" },
                { "id": "s2", "title": "Audit" },
            ],
            "total": 2
        })))
        .mount(&server)
        .await;

    let mut args = server_args(&server);
    args.extend(
        ["streams", "find", "-t", "Audit"]
            .into_iter()
            .map(String::from),
    );
    let output = run(args).await;

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "s2\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_users_get_missing_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "type": "ApiError", "message": "Couldn't find user ghost"
        })))
        .mount(&server)
        .await;

    let mut args = server_args(&server);
    args.extend(["users", "get", "ghost"].into_iter().map(String::from));
    let output = run(args).await;

    assert_eq!(output.status.code(), Some(4));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_backup_streams_writes_file() {
    let server = MockServer::start().await;
    let listing = json!({
        "streams": [{ "id": "s1", "title": "FOO - bar", "disabled": false }],
        "total": 1
    });
    Mock::given(method("GET"))
        .and(path("/streams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut args = server_args(&server);
    args.extend([
        "backup".into(),
        "streams".into(),
        "-d".into(),
        dir.path().display().to_string(),
    ]);
    let output = run(args).await;
    assert_eq!(output.status.code(), Some(0));

    let written: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(written.len(), 1);
    let name = written[0].file_name().unwrap().to_str().unwrap().to_owned();
    assert!(name.starts_with("streams-"), "unexpected file {name}");
    assert!(stdout(&output).contains(&name));

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&written[0]).unwrap()).unwrap();
    assert_eq!(saved, listing);
}

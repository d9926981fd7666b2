// ABOUTME: Integration tests for the clusterup CLI.
// ABOUTME: Validates --help output, argument checks, and hub reachability errors.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn clusterup_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("clusterup"))
}

#[test]
fn help_shows_commands() {
    clusterup_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("hub"))
        .stdout(predicate::str::contains("agent"))
        .stdout(predicate::str::contains("check-config"))
        .stdout(predicate::str::contains("check-object-count"))
        .stdout(predicate::str::contains("prepare-init-cluster"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn check_config_requires_db_port() {
    clusterup_cmd()
        .args(["check-config", "--old-bin-dir", "/usr/local/gpdb/bin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--db-port"));
}

#[test]
fn quiet_and_json_conflict() {
    clusterup_cmd()
        .args(["--quiet", "--json", "status"])
        .assert()
        .failure();
}

#[test]
fn unreachable_hub_is_reported() {
    let temp_dir = tempfile::tempdir().unwrap();
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    fs::write(
        temp_dir.path().join("clusterup.yml"),
        format!("hub_host: 127.0.0.1\nhub_port: {port}\n"),
    )
    .unwrap();

    clusterup_cmd()
        .current_dir(temp_dir.path())
        .arg("ping")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to connect"));
}

#[test]
fn malformed_config_is_reported() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join("clusterup.yml"), "hub_port: [not, a, port]\n").unwrap();

    clusterup_cmd()
        .current_dir(temp_dir.path())
        .arg("ping")
        .assert()
        .failure()
        .stderr(predicate::str::contains("YAML parse error"));
}

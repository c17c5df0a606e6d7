//! End-to-end tests for the `oob` binary

use assert_cmd::Command;
use oob_core::packet::FrameBuilder;
use predicates::prelude::*;
use tempfile::TempDir;

/// `oob` running in an empty directory, so no config file is discovered
fn oob(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("oob").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("OOB_CONFIG")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    oob(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("inspect"))
        .stdout(predicate::str::contains("interfaces"));
}

#[test]
fn test_inspect_tcp_frame() {
    let dir = TempDir::new().unwrap();
    let frame = FrameBuilder::tcp_v4()
        .src_ip_v4([10, 0, 0, 2])
        .dst_ip_v4([192, 168, 1, 1])
        .src_port(51000)
        .dst_port(80)
        .seq(1000)
        .payload(b"GET / HTTP/1.1\r\nHost: 192.168.1.1\r\n\r\n")
        .build();

    oob(&dir)
        .args(["inspect", "--reset", &hex::encode(frame)])
        .assert()
        .success()
        .stdout(predicate::str::contains("10.0.0.2 -> 192.168.1.1"))
        .stdout(predicate::str::contains("seq 1000"))
        .stdout(predicate::str::contains("reset:"));
}

#[test]
fn test_inspect_rejects_bad_hex() {
    let dir = TempDir::new().unwrap();
    oob(&dir)
        .args(["inspect", "zz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not valid hex"));
}

#[test]
fn test_config_init_then_validate() {
    let dir = TempDir::new().unwrap();
    oob(&dir).args(["config", "init", "generated.toml"]).assert().success();
    assert!(dir.path().join("generated.toml").exists());

    oob(&dir)
        .args(["config", "validate", "generated.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));

    // Refuses to clobber without --force
    oob(&dir).args(["config", "init", "generated.toml"]).assert().failure();
    oob(&dir)
        .args(["config", "init", "generated.toml", "--force"])
        .assert()
        .success();
}

#[test]
fn test_config_validate_reports_bad_value() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("bad.toml"), "[engine]\ningress_capacity = 0\n").unwrap();

    oob(&dir)
        .args(["config", "validate", "bad.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("engine.ingress_capacity"));
}

#[test]
fn test_config_show_uses_explicit_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("custom.toml"),
        "[engine]\nworkers = 7\n\n[policy]\nhosts = [\"blocked.example\"]\n",
    )
    .unwrap();

    oob(&dir)
        .args(["-c", "custom.toml", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("workers = 7"))
        .stdout(predicate::str::contains("blocked.example"));
}

#[test]
fn test_run_without_hosts_fails() {
    let dir = TempDir::new().unwrap();
    oob(&dir)
        .args(["-q", "run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No hosts to block"));
}

#[test]
fn test_completions() {
    let dir = TempDir::new().unwrap();
    oob(&dir)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("oob"));
}

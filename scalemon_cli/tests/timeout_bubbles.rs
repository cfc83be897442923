use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn persistent_timeouts_end_the_monitor() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("cfg.toml");
    // every fetch times out
    fs::write(
        &cfg,
        "[polling]\ninterval_ms = 5\ntimeout_ms = 20\n\n[simulator]\ntimeout_every = 1\n",
    )
    .unwrap();

    Command::cargo_bin("scalemon_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .args(["monitor", "--samples", "3"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("did not answer"));
}

#[test]
fn occasional_timeouts_are_tolerated() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("cfg.toml");
    fs::write(
        &cfg,
        "[polling]\ninterval_ms = 5\ntimeout_ms = 20\n\n[simulator]\nload = 1.0\ntimeout_every = 2\n",
    )
    .unwrap();

    Command::cargo_bin("scalemon_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .args(["monitor", "--samples", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("readings=4"));
}

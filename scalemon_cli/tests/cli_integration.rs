use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_config(dir: &tempfile::TempDir, extra: &str) -> PathBuf {
    let toml = format!(
        r#"
[polling]
interval_ms = 5
timeout_ms = 50

[average]
window_ms = 60000
channel = "weight"

[simulator]
scale = 420.0
offset = 8400.0
load = 100.0
{extra}
"#
    );
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn write_points(dir: &tempfile::TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("points.csv");
    fs::write(&path, body).unwrap();
    path
}

const GOOD_POINTS: &str = "raw,actual\n8400,0\n50400,100\n92400,200\n";

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["fit"], 1, "No calibration points", "stderr")]
#[case(&["monitor", "--samples", "0"], 2, "samples", "stderr")]
#[case(&["self-check"], 0, "OK", "stdout")]
#[case(&["monitor", "--samples", "3"], 0, "mean=100.000", "stdout")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    let mut cmd = Command::cargo_bin("scalemon_cli").unwrap();
    cmd.arg("--config").arg(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    if stream == "stdout" {
        assert.stdout(predicate::str::contains(needle));
    } else {
        assert.stderr(predicate::str::contains(needle));
    }
}

#[test]
fn fit_prints_scale_and_offset() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");
    let points = write_points(&dir, GOOD_POINTS);

    Command::cargo_bin("scalemon_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("fit")
        .arg("--points")
        .arg(&points)
        .assert()
        .success()
        .stdout(predicate::str::contains("scale:     420.000"))
        .stdout(predicate::str::contains("offset:    8400.000"))
        .stdout(predicate::str::contains("3 used / 3 total"));
}

#[test]
fn fit_uses_points_from_config() {
    let dir = tempdir().unwrap();
    let points = write_points(&dir, GOOD_POINTS);
    let extra = format!(
        "\n[calibration]\npoints = {:?}\nzero_weight = 0.0\n",
        points.display().to_string()
    );
    let cfg = write_config(&dir, &extra);

    Command::cargo_bin("scalemon_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("fit")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 used / 3 total"));
}

#[rstest]
#[case("raw,actual\n8400,0\n50400,100\n", &["--zero-weight", "0"], 3, "usable calibration point")]
#[case("raw,actual\n500,1\n500,2\n500,3\n", &[], 3, "do not define a line")]
#[case(GOOD_POINTS, &["--exclude", "7"], 5, "does not exist")]
#[case("raw,grams\n1,2\n", &[], 1, "Invalid headers in calibration CSV")]
#[case("raw,actual\n1,abc\n", &[], 1, "could not be read")]
fn fit_failures_map_to_exit_codes(
    #[case] csv: &str,
    #[case] extra: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");
    let points = write_points(&dir, csv);

    let mut cmd = Command::cargo_bin("scalemon_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("fit")
        .arg("--points")
        .arg(&points);
    for a in extra {
        cmd.arg(a);
    }
    cmd.assert()
        .code(exit_code)
        .stderr(predicate::str::contains(needle));
}

#[test]
fn excluded_rows_leave_the_fit() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");
    // row 3 is an outlier; excluding it restores the exact line
    let points = write_points(&dir, "raw,actual\n8400,0\n50400,100\n92400,200\n60000,5\n");

    Command::cargo_bin("scalemon_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .args(["fit", "--exclude", "3", "--residuals", "--points"])
        .arg(&points)
        .assert()
        .success()
        .stdout(predicate::str::contains("scale:     420.000"))
        .stdout(predicate::str::contains("3 used / 3 total"))
        .stdout(predicate::str::contains("residuals:"));
}

#[test]
fn invalid_config_is_reported() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "\n[history]\nmax_samples = 5\nmax_age_ms = 1000\n");

    Command::cargo_bin("scalemon_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("self-check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration is invalid"))
        .stderr(predicate::str::contains("not both"));
}

#[test]
fn replay_stops_when_the_file_ends() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");
    let replay = dir.path().join("status.jsonl");
    fs::write(
        &replay,
        "{\"raw_value\": 50400, \"weight\": 100.0}\n\n{\"raw_value\": \"92400\", \"weight\": \"200.0\"}\n",
    )
    .unwrap();

    Command::cargo_bin("scalemon_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .args(["monitor", "--samples", "10", "--replay"])
        .arg(&replay)
        .assert()
        .success()
        .stdout(predicate::str::contains("readings=2"))
        .stdout(predicate::str::contains("mean=150.000"));
}

#[test]
fn replay_without_averaged_channel_is_an_empty_window() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");
    let replay = dir.path().join("status.jsonl");
    fs::write(&replay, "{\"raw_value\": 50400}\n").unwrap();

    Command::cargo_bin("scalemon_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .args(["monitor", "--replay"])
        .arg(&replay)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("No samples fell inside"));
}

#[test]
fn load_override_reaches_the_simulator() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    Command::cargo_bin("scalemon_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .args(["monitor", "--samples", "2", "--load", "-5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mean=-5.000"))
        .stdout(predicate::str::contains("device calibration: scale=420.000"));
}

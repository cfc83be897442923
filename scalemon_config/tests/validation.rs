use rstest::rstest;
use scalemon_config::{ChannelName, HistoryLimit, load_toml};

const FULL: &str = r#"
[polling]
interval_ms = 250
timeout_ms = 200

[history]
max_age_ms = 300000

[average]
window_ms = 5000
channel = "raw"

[calibration]
zero_weight = 0.0
points = "etc/points.csv"

[simulator]
scale = 420.0
offset = 8400.0
load = 125.0
ripple = 0.5
battery_v = 3.9
vdd33 = 3310.0

[logging]
level = "debug"
rotation = "daily"
"#;

#[test]
fn full_config_parses_and_validates() {
    let cfg = load_toml(FULL).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.polling.interval_ms, 250);
    assert_eq!(cfg.history.limit(), HistoryLimit::AgeMs(300_000));
    assert_eq!(cfg.average.channel, ChannelName::Raw);
    assert_eq!(cfg.calibration.zero_weight, Some(0.0));
    assert_eq!(cfg.simulator.load, 125.0);
}

#[test]
fn unknown_channel_is_a_parse_error() {
    let err = load_toml("[average]\nchannel = \"humidity\"\n").expect_err("bad channel");
    assert!(format!("{err}").contains("humidity"));
}

#[rstest]
#[case("[polling]\ninterval_ms = 0\n", "polling.interval_ms must be >= 1")]
#[case("[polling]\ntimeout_ms = 0\n", "polling.timeout_ms must be >= 1")]
#[case("[history]\nmax_samples = 20\nmax_age_ms = 1000\n", "not both")]
#[case("[history]\nmax_samples = 0\n", "history.max_samples must be >= 1")]
#[case("[history]\nmax_age_ms = 0\n", "history.max_age_ms must be >= 1")]
#[case("[average]\nwindow_ms = 0\n", "average.window_ms must be >= 1")]
#[case("[simulator]\nscale = 0.0\n", "simulator.scale")]
#[case("[simulator]\nripple = -1.0\n", "simulator.ripple must be >= 0")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation")]
fn rejects_out_of_range_values(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    assert!(
        format!("{err}").contains(needle),
        "expected {needle:?} in {err}"
    );
}

#[test]
fn shipped_sample_files_are_valid() {
    let cfg = load_toml(include_str!("../../etc/scalemon.toml")).expect("parse sample config");
    cfg.validate().expect("sample config validates");
    assert_eq!(cfg.simulator.timeout_every, 0);

    let rows = scalemon_config::read_calibration_csv(
        include_str!("../../etc/calibration_points.csv").as_bytes(),
        "sample",
    )
    .expect("sample points load");
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].actual, 0.0);
}

use std::fs;
use std::io::Cursor;
use std::time::Duration;

use rstest::rstest;
use scalemon_device::{DeviceError, ReplaySource};
use scalemon_traits::TelemetrySource;
use tempfile::tempdir;

#[rstest]
fn replays_lines_then_reports_exhaustion() {
    let data = "{\"raw_value\": 1}\n\n{\"raw_value\": 2, \"weight\": 0.5}\n";
    let mut src = ReplaySource::from_reader(Cursor::new(data));

    assert_eq!(src.next_frame().unwrap().raw_value, 1.0);
    let second = src.next_frame().unwrap();
    assert_eq!(second.weight, Some(0.5));
    assert!(matches!(src.next_frame(), Err(DeviceError::Exhausted)));
}

#[rstest]
fn parse_errors_name_the_line() {
    let data = "{\"raw_value\": 1}\n{\"raw\": 2}\n";
    let mut src = ReplaySource::from_reader(Cursor::new(data));
    src.next_frame().unwrap();
    let err = src.next_frame().expect_err("bad line");
    assert!(format!("{err}").contains("line 2"), "{err}");
}

#[rstest]
fn invalid_utf8_line_still_counts_toward_line_numbers() {
    let mut data = b"{\"raw_value\": 1}\n".to_vec();
    data.extend_from_slice(b"\xff\xfe\n");
    data.extend_from_slice(b"{\"raw\": 3}\n");
    data.extend_from_slice(b"{\"raw_value\": 4}\n");
    let mut src = ReplaySource::from_reader(Cursor::new(data));

    src.next_frame().unwrap();
    let utf8 = src.next_frame().expect_err("invalid UTF-8");
    assert!(format!("{utf8}").contains("line 2"), "{utf8}");
    let parse = src.next_frame().expect_err("missing raw_value");
    assert!(format!("{parse}").contains("line 3"), "{parse}");
    assert_eq!(src.next_frame().unwrap().raw_value, 4.0);
}

#[rstest]
fn file_source_goes_through_the_trait() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("status.jsonl");
    fs::write(&path, "{\"raw_value\": 8400}\n").unwrap();

    let mut src = ReplaySource::open(&path).unwrap();
    let t = src.fetch(Duration::from_millis(10)).unwrap();
    assert_eq!(t.raw_value, 8400.0);

    let err = src.fetch(Duration::from_millis(10)).expect_err("exhausted");
    assert!(matches!(
        err.downcast_ref::<DeviceError>(),
        Some(DeviceError::Exhausted)
    ));
}

#[rstest]
fn missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let err = ReplaySource::open(&dir.path().join("none.jsonl")).err().unwrap();
    assert!(matches!(err, DeviceError::Io(_)));
}

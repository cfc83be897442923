#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(t) = scalemon_device::parse_status(data) {
        assert!(t.raw_value.is_finite());
    }
});

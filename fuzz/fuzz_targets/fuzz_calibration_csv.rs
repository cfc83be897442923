#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(rows) = scalemon_config::read_calibration_csv(data, "fuzz") else {
        return;
    };
    // Rows that load must never make the fitter panic or yield a non-finite fit.
    if let Ok(fitter) = scalemon_core::CalibrationFitter::from_rows(&rows, Some(0.0))
        && let Ok(fit) = fitter.fit()
    {
        assert!(fit.scale.is_finite() && fit.offset.is_finite());
        assert!(fit.scale != 0.0);
        assert!(fit.r_squared.is_finite());
    }
});

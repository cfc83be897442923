//! Human-readable error descriptions and structured JSON error formatting.

use scalemon_core::CoreError;

/// Stable process exit codes. Clap usage errors exit with 2 on their own.
pub mod exit {
    pub const OK: i32 = 0;
    pub const GENERIC: i32 = 1;
    pub const FIT_FAILED: i32 = 3;
    pub const EMPTY_WINDOW: i32 = 4;
    pub const INVALID_INPUT: i32 = 5;
    pub const SOURCE: i32 = 6;
}

/// Whole cause chain of `err`, outermost first, joined with ": ".
fn chain_text(err: &eyre::Report) -> String {
    err.chain()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(ce) = err.downcast_ref::<CoreError>() {
        return match ce {
            CoreError::InsufficientData { usable } => format!(
                "What happened: Only {usable} usable calibration point(s); a fit needs at least 2.\nLikely causes: Too few rows in the CSV, or most rows match the zero weight.\nHow to fix: Record more points at different loads, or check --zero-weight / calibration.zero_weight."
            ),
            CoreError::DegenerateFit(why) => format!(
                "What happened: Calibration points do not define a line ({why}).\nLikely causes: Every point was taken at the same raw reading, or all actual values are equal.\nHow to fix: Add points at clearly different loads."
            ),
            CoreError::IndexOutOfRange { index, len } => format!(
                "What happened: Point index {index} does not exist (there are {len} points).\nLikely causes: --exclude uses 0-based row indices, header not counted.\nHow to fix: Pick an index below {len}."
            ),
            CoreError::EmptyWindow => "What happened: No samples fell inside the averaging window.\nLikely causes: No readings arrived yet, or the averaged channel is missing from the payload.\nHow to fix: Wait for readings, or set average.channel to a field the device reports.".to_string(),
            CoreError::InvalidInput(msg) => format!(
                "What happened: Invalid input ({msg}).\nLikely causes: A non-finite or out-of-range number.\nHow to fix: Correct the value and rerun."
            ),
            CoreError::Timeout => "What happened: The device did not answer within the fetch timeout.\nLikely causes: Device offline or overloaded, or polling.timeout_ms too low.\nHow to fix: Check the device and raise polling.timeout_ms if needed.".to_string(),
            CoreError::SourceExhausted => "What happened: The telemetry source has no more readings.\nLikely causes: The replay file ended.\nHow to fix: Use a longer recording or fewer --samples.".to_string(),
            CoreError::OrderViolation { .. } => format!(
                "What happened: {ce}.\nLikely causes: Readings were stamped out of order.\nHow to fix: Re-run with --log-level=debug and report the log."
            ),
            CoreError::Source(msg) => format!(
                "What happened: Reading telemetry failed ({msg}).\nLikely causes: Malformed status payload or an I/O error.\nHow to fix: Check the replay file or device output; re-run with --log-level=debug for detail."
            ),
        };
    }

    // String-based heuristics for errors coming from config or CSV loading
    let msg = chain_text(err);
    let lower = msg.to_ascii_lowercase();

    if lower.contains("calibration csv must have headers") {
        return "Invalid headers in calibration CSV. Expected 'raw,actual'.".to_string();
    }

    if lower.contains("invalid csv row") {
        return format!(
            "What happened: A calibration CSV row could not be read.\nLikely causes: Missing column or a value that is not a number.\nHow to fix: Fix the row and rerun. Original: {msg}"
        );
    }

    if lower.contains("invalid configuration") || lower.contains("parse config") {
        return format!(
            "What happened: Configuration is invalid.\nLikely causes: Out-of-range or conflicting values in the TOML.\nHow to fix: Edit the config file and try again. Original: {msg}"
        );
    }

    if lower.contains("no calibration points") {
        return "What happened: No calibration points were given.\nHow to fix: Pass --points <FILE> or set calibration.points in the config.".to_string();
    }

    // Generic fallback
    format!(
        "Something went wrong.\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Map error kinds to stable exit codes; unknown errors return 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<CoreError>() {
        Some(CoreError::InsufficientData { .. } | CoreError::DegenerateFit(_)) => exit::FIT_FAILED,
        Some(CoreError::EmptyWindow) => exit::EMPTY_WINDOW,
        Some(CoreError::InvalidInput(_) | CoreError::IndexOutOfRange { .. }) => {
            exit::INVALID_INPUT
        }
        Some(
            CoreError::Timeout
            | CoreError::Source(_)
            | CoreError::SourceExhausted
            | CoreError::OrderViolation { .. },
        ) => exit::SOURCE,
        None => exit::GENERIC,
    }
}

pub fn error_reason_name(e: &CoreError) -> &'static str {
    match e {
        CoreError::InvalidInput(_) => "InvalidInput",
        CoreError::IndexOutOfRange { .. } => "IndexOutOfRange",
        CoreError::EmptyWindow => "EmptyWindow",
        CoreError::InsufficientData { .. } => "InsufficientData",
        CoreError::DegenerateFit(_) => "DegenerateFit",
        CoreError::OrderViolation { .. } => "OrderViolation",
        CoreError::Timeout => "Timeout",
        CoreError::SourceExhausted => "SourceExhausted",
        CoreError::Source(_) => "Source",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    if let Some(ce) = err.downcast_ref::<CoreError>() {
        let details = match ce {
            CoreError::InsufficientData { usable } => Some(json!({ "usable": usable })),
            CoreError::IndexOutOfRange { index, len } => {
                Some(json!({ "index": index, "len": len }))
            }
            CoreError::OrderViolation { newest_ms, got_ms } => {
                Some(json!({ "newest_ms": newest_ms, "got_ms": got_ms }))
            }
            _ => None,
        };
        let reason = error_reason_name(ce);
        let msg = humanize(err);
        let obj = if let Some(d) = details {
            json!({ "reason": reason, "details": d, "message": msg })
        } else {
            json!({ "reason": reason, "message": msg })
        };
        return obj.to_string();
    }

    // Generic error JSON
    json!({ "reason": "Error", "message": humanize(err) }).to_string()
}

//! `monitor` command: poll a telemetry source and report the rolling mean.

use eyre::WrapErr;
use scalemon_core::{
    Channel, CoreError, MonitorCfg, PolledFrame, Poller, PollerCfg, TelemetryMonitor,
};
use scalemon_device::{ReplaySource, SimulatedDevice};
use scalemon_traits::TelemetrySource;
use scalemon_traits::clock::MonotonicClock;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// How long one wait for a frame may block before re-checking shutdown.
const RECV_SLICE: Duration = Duration::from_millis(50);
/// Consecutive failed fetches tolerated before the command gives up.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 5;

pub struct MonitorArgs<'a> {
    pub samples: u64,
    pub replay: Option<&'a Path>,
    pub interval_ms: Option<u64>,
    pub load: Option<f64>,
}

/// Simulated device configured from `[simulator]`, with an optional load override.
pub fn build_simulator(sim: &scalemon_config::Simulator, load: Option<f64>) -> SimulatedDevice {
    SimulatedDevice::new()
        .with_calibration(sim.scale, sim.offset)
        .with_load(load.unwrap_or(sim.load))
        .with_ripple(sim.ripple)
        .with_battery(sim.battery_v)
        .with_vdd33(sim.vdd33)
        .with_timeout_every(sim.timeout_every)
}

fn build_source(
    cfg: &scalemon_config::Config,
    args: &MonitorArgs<'_>,
) -> eyre::Result<Box<dyn TelemetrySource + Send>> {
    if let Some(path) = args.replay {
        let replay = ReplaySource::open(path)
            .wrap_err_with(|| format!("open replay file {}", path.display()))?;
        return Ok(Box::new(replay));
    }
    if let Some(load) = args.load
        && !load.is_finite()
    {
        return Err(CoreError::InvalidInput(format!("load must be finite, got {load}")).into());
    }
    Ok(Box::new(build_simulator(&cfg.simulator, args.load)))
}

pub fn run_monitor(
    cfg: &scalemon_config::Config,
    args: &MonitorArgs<'_>,
    json: bool,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<()> {
    let mut pcfg = PollerCfg::from(&cfg.polling);
    if let Some(ms) = args.interval_ms {
        if ms == 0 {
            eyre::bail!("--interval-ms must be >= 1");
        }
        pcfg.interval = Duration::from_millis(ms);
    }
    let mcfg = MonitorCfg::from(cfg);
    let source = build_source(cfg, args)?;

    tracing::info!(
        interval_ms = scalemon_core::util::millis(pcfg.interval),
        rate_hz = scalemon_core::util::rate_hz(pcfg.interval),
        average_window_ms = mcfg.average_window_ms,
        channel = mcfg.average_channel.name(),
        replay = args.replay.is_some(),
        "monitor start"
    );

    let poller = Poller::spawn(source, pcfg.interval, pcfg.timeout, MonotonicClock::new());
    let mut monitor = TelemetryMonitor::new(mcfg);
    let mut readings = 0u64;
    let mut failures_in_row = 0u32;

    while readings < args.samples {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!(readings, "interrupted");
            break;
        }
        let Some(result) = poller.recv_timeout(RECV_SLICE) else {
            continue;
        };
        match result {
            Ok(frame) => {
                failures_in_row = 0;
                monitor.ingest(frame.time_ms, &frame.telemetry)?;
                readings += 1;
                print_frame(&monitor, &frame, json);
            }
            Err(CoreError::SourceExhausted) => {
                tracing::info!(readings, "telemetry source exhausted");
                break;
            }
            Err(e) => {
                failures_in_row += 1;
                if failures_in_row >= MAX_CONSECUTIVE_FAILURES {
                    return Err(e).wrap_err_with(|| {
                        format!("giving up after {failures_in_row} failed fetches in a row")
                    });
                }
            }
        }
    }

    let stats = PollStats {
        readings,
        failed: poller.failed_fetches(),
        skipped_ticks: poller.skipped_ticks(),
        dropped: poller.dropped_frames(),
    };
    drop(poller);
    print_summary(&monitor, &stats, json)
}

struct PollStats {
    readings: u64,
    failed: u64,
    skipped_ticks: u64,
    dropped: u64,
}

fn print_frame(monitor: &TelemetryMonitor, frame: &PolledFrame, json: bool) {
    let t = &frame.telemetry;
    let mean = monitor.rolling_mean().ok();
    let in_window = monitor.window().len();
    if json {
        let line = serde_json::json!({
            "time_ms": frame.time_ms,
            "raw": t.raw_value,
            "weight": t.weight,
            "battery": t.battery,
            "vdd33": t.vdd33,
            "mean": mean,
            "window": in_window,
        });
        println!("{line}");
        return;
    }
    let weight = t
        .weight
        .map_or_else(|| "-".to_string(), |w| format!("{w:.3}"));
    let mean = mean.map_or_else(|| "-".to_string(), |m| format!("{m:.3}"));
    println!(
        "t={:>7}ms raw={:<10} weight={weight:<10} mean={mean} (n={in_window})",
        frame.time_ms, t.raw_value
    );
}

fn print_summary(monitor: &TelemetryMonitor, stats: &PollStats, json: bool) -> eyre::Result<()> {
    let channel = monitor.cfg().average_channel;
    let summary = monitor
        .summary()
        .wrap_err_with(|| format!("no {} readings to average", channel.name()))?;
    let device = monitor.device_calibration();
    let raw_points = monitor.history(Channel::Raw).len();

    if json {
        let mut obj = serde_json::json!({
            "summary": {
                "readings": stats.readings,
                "failed_fetches": stats.failed,
                "skipped_ticks": stats.skipped_ticks,
                "dropped_frames": stats.dropped,
                "channel": channel.name(),
                "count": summary.count,
                "mean": summary.mean,
                "min": summary.min,
                "max": summary.max,
                "span_ms": summary.span_ms,
                "history": raw_points,
            }
        });
        if let Some(m) = device {
            obj["summary"]["device_scale"] = serde_json::json!(m.scale);
            obj["summary"]["device_offset"] = serde_json::json!(m.offset);
        }
        println!("{obj}");
        return Ok(());
    }

    println!(
        "summary: readings={} failed={} skipped_ticks={} dropped={}",
        stats.readings, stats.failed, stats.skipped_ticks, stats.dropped
    );
    println!(
        "{} over {} ms: mean={:.3} min={:.3} max={:.3} (n={})",
        channel.name(),
        summary.span_ms,
        summary.mean,
        summary.min,
        summary.max,
        summary.count
    );
    if let Some(m) = device {
        println!("device calibration: scale={:.3} offset={:.3}", m.scale, m.offset);
    }
    Ok(())
}

/// Validate the simulator settings by taking one reading and checking it
/// converts back through the configured calibration.
pub fn run_self_check(cfg: &scalemon_config::Config, json: bool) -> eyre::Result<()> {
    let mut device = build_simulator(&cfg.simulator, None);
    let timeout = Duration::from_millis(cfg.polling.timeout_ms);
    let t = device
        .fetch(timeout)
        .map_err(|e| scalemon_core::source_error::map_source_error(e.as_ref()))
        .wrap_err("simulator reading")?;
    let model = scalemon_core::CalibrationModel::new(cfg.simulator.scale, cfg.simulator.offset)?;
    let expected = model.weight_of(t.raw_value);
    if let Some(w) = t.weight
        && (w - expected).abs() > 1e-9 * expected.abs().max(1.0)
    {
        eyre::bail!("simulator weight {w} disagrees with calibration ({expected})");
    }
    tracing::info!(raw = t.raw_value, weight = expected, "self-check reading");

    if json {
        println!(
            "{}",
            serde_json::json!({ "config": "ok", "raw": t.raw_value, "weight": expected })
        );
    } else {
        println!("config: ok");
        println!("simulator: raw={} weight={expected:.3}", t.raw_value);
        println!("OK");
    }
    Ok(())
}

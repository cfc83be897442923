//! `fit` command: load calibration points, fit, and print scale/offset.

use eyre::WrapErr;
use scalemon_core::calibration::DISPLAY_DECIMALS;
use scalemon_core::{CalibrationFitter, FitResult};
use std::path::{Path, PathBuf};

pub struct FitArgs<'a> {
    pub points: Option<&'a Path>,
    pub zero_weight: Option<f64>,
    pub exclude: &'a [usize],
    pub residuals: bool,
}

/// Points file from the command line, else `calibration.points`.
fn points_path(cfg: &scalemon_config::Config, cli: Option<&Path>) -> eyre::Result<PathBuf> {
    cli.map(Path::to_path_buf)
        .or_else(|| cfg.calibration.points.as_deref().map(PathBuf::from))
        .ok_or_else(|| eyre::eyre!("no calibration points: pass --points or set calibration.points"))
}

/// Build the fitter with excluded rows already removed.
pub fn build_fitter(
    cfg: &scalemon_config::Config,
    args: &FitArgs<'_>,
) -> eyre::Result<CalibrationFitter> {
    let path = points_path(cfg, args.points)?;
    let rows = scalemon_config::load_calibration_csv(&path)?;
    let zero = args.zero_weight.or(cfg.calibration.zero_weight);
    let mut fitter = CalibrationFitter::from_rows(&rows, zero)?;

    // Highest first so earlier indices stay valid
    let mut exclude = args.exclude.to_vec();
    exclude.sort_unstable_by(|a, b| b.cmp(a));
    exclude.dedup();
    for idx in exclude {
        let p = fitter.remove_point(idx)?;
        tracing::debug!(index = idx, raw = p.raw, actual = p.actual, "point excluded");
    }
    tracing::info!(
        path = %path.display(),
        points = fitter.len(),
        zero_weight = ?fitter.zero_weight(),
        "calibration points loaded"
    );
    Ok(fitter)
}

pub fn run_fit(cfg: &scalemon_config::Config, args: &FitArgs<'_>, json: bool) -> eyre::Result<()> {
    let fitter = build_fitter(cfg, args)?;
    let fit = fitter.fit().wrap_err("fitting calibration points")?;
    let residuals = if args.residuals {
        Some(fitter.residuals()?)
    } else {
        None
    };
    tracing::info!(
        scale = fit.scale,
        offset = fit.offset,
        r_squared = fit.r_squared,
        points_used = fit.points_used,
        "calibration fit"
    );

    if json {
        println!("{}", fit_json(&fit, fitter.len(), residuals.as_deref()));
    } else {
        print_fit(&fitter, &fit, residuals.as_deref());
    }
    Ok(())
}

fn fit_json(fit: &FitResult, total: usize, residuals: Option<&[f64]>) -> serde_json::Value {
    let shown = fit.rounded();
    let mut obj = serde_json::json!({
        "scale": shown.scale,
        "offset": shown.offset,
        "slope": fit.slope,
        "intercept": fit.intercept,
        "r_squared": fit.r_squared,
        "points_used": fit.points_used,
        "points_total": total,
    });
    if let Some(r) = residuals {
        obj["residuals"] = serde_json::json!(r);
    }
    obj
}

fn print_fit(fitter: &CalibrationFitter, fit: &FitResult, residuals: Option<&[f64]>) {
    let prec = DISPLAY_DECIMALS as usize;
    let shown = fit.rounded();
    println!("scale:     {:.prec$}", shown.scale);
    println!("offset:    {:.prec$}", shown.offset);
    println!("r_squared: {:.6}", fit.r_squared);
    println!("points:    {} used / {} total", fit.points_used, fitter.len());
    if let Some(res) = residuals {
        let zero = fitter.zero_weight();
        println!("residuals:");
        for (i, (p, r)) in fitter.points().iter().zip(res).enumerate() {
            let note = if zero == Some(p.actual) {
                " (zero weight, not fitted)"
            } else {
                ""
            };
            println!(
                "  #{i:<3} raw={:<12} actual={:<10.prec$} residual={r:+.prec$}{note}",
                p.raw, p.actual
            );
        }
    }
}

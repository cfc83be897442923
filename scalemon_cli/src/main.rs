mod cli;
mod error_fmt;
mod fit;
mod logging;
mod monitor;

use clap::Parser;
use cli::{Cli, Commands, DEFAULT_CONFIG, JSON_MODE};
use error_fmt::{exit, exit_code_for_error, format_error_json, humanize};
use eyre::WrapErr;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    let code = match run(cli) {
        Ok(()) => exit::OK,
        Err(e) => {
            if JSON_MODE.get().copied().unwrap_or(false) {
                println!("{}", format_error_json(&e));
            } else {
                eprintln!("{}", humanize(&e));
            }
            exit_code_for_error(&e)
        }
    };
    std::process::exit(code);
}

/// Read and validate the config. Without `--config`, the default path is
/// used if it exists and built-in defaults otherwise.
fn load_config(path: Option<&Path>) -> eyre::Result<scalemon_config::Config> {
    let path = match path {
        Some(p) => Some(p),
        None => Some(Path::new(DEFAULT_CONFIG)).filter(|p| p.exists()),
    };
    let cfg = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .wrap_err_with(|| format!("read config {}", p.display()))?;
            scalemon_config::load_toml(&text)
                .wrap_err_with(|| format!("parse config {}", p.display()))?
        }
        None => scalemon_config::Config::default(),
    };
    cfg.validate().wrap_err("invalid configuration")?;
    Ok(cfg)
}

fn run(cli: Cli) -> eyre::Result<()> {
    let cfg = load_config(cli.config.as_deref())?;
    logging::init(cli.json, cli.log_level.as_deref(), &cfg.logging)?;
    tracing::debug!(config = ?cli.config, "configuration loaded");

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&shutdown);
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
            tracing::warn!(error = %e, "failed to install Ctrl-C handler");
        }
    }

    match cli.cmd {
        Commands::Fit {
            points,
            zero_weight,
            exclude,
            residuals,
        } => fit::run_fit(
            &cfg,
            &fit::FitArgs {
                points: points.as_deref(),
                zero_weight,
                exclude: &exclude,
                residuals,
            },
            cli.json,
        ),
        Commands::Monitor {
            samples,
            replay,
            interval_ms,
            load,
        } => monitor::run_monitor(
            &cfg,
            &monitor::MonitorArgs {
                samples,
                replay: replay.as_deref(),
                interval_ms,
                load,
            },
            cli.json,
            shutdown,
        ),
        Commands::SelfCheck => monitor::run_self_check(&cfg, cli.json),
    }
}

mod cli;
mod error_fmt;
mod run;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use error_fmt::{exit_code_for_error, format_error_json, humanize};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install error hooks: {e}");
    }

    let code = match real_main(cli) {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = %e, "exiting with error");
            if JSON_MODE.get().copied().unwrap_or(false) {
                eprintln!("{}", format_error_json(&e));
            } else {
                eprintln!("{}", humanize(&e));
            }
            exit_code_for_error(&e)
        }
    };
    std::process::exit(code);
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let cfg = run::load_config(&cli.config)?;
    init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging);
    tracing::debug!(config = %cli.config.display(), "config loaded");

    let base = cli
        .config
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let csv = cli.weights_csv.as_deref();

    match cli.cmd {
        Commands::Run {
            weights,
            tolerance,
            tare,
            max_ticks,
        } => {
            let weights = run::resolve_weights(&cfg, csv, weights.as_deref())?;
            let stop = Arc::new(AtomicBool::new(false));
            {
                let stop = Arc::clone(&stop);
                if let Err(e) = ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed)) {
                    tracing::warn!(error = %e, "cannot install Ctrl-C handler");
                }
            }
            let args = run::RunArgs {
                weights,
                tolerance,
                tare,
                max_ticks,
            };
            run::run_player(&cfg, &base, args, &stop, cli.json)?;
        }
        Commands::Measure { ticks } => run::measure(&cfg, ticks, cli.json)?,
        Commands::Targets { weights } => {
            let weights = run::resolve_weights(&cfg, csv, weights.as_deref())?;
            run::print_targets(&cfg, &weights, cli.json)?;
        }
        Commands::SelfCheck { cpuinfo } => {
            // weights are optional here; report them only when present
            let weights = if cfg.calibration.weights.is_empty() && csv.is_none() {
                None
            } else {
                Some(run::resolve_weights(&cfg, csv, None)?)
            };
            run::self_check(&cfg, &base, &cpuinfo, weights.as_deref(), cli.json)?;
        }
    }
    Ok(())
}

/// Console layer on stderr (pretty or JSON) plus an optional JSON file sink.
///
/// `RUST_LOG` wins over `--log-level`, which wins over `[logging].level`.
fn init_tracing(json: bool, cli_level: Option<&str>, logging: &bottles_config::Logging) {
    let level = cli_level.or(logging.level.as_deref()).unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let console = if json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let file = logging.file.as_deref().map(|path| {
        let path = Path::new(path);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .map_or_else(|| "bottles.log".into(), |n| n.to_os_string());
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(writer)
            .boxed()
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init();
}

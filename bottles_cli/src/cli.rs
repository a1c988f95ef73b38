//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "bottles", version, about = "Music bottles player")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/bottles.toml")]
    pub config: PathBuf,

    /// Optional item weights CSV (strict header: `bottle,cap` or `cap`)
    #[arg(long = "weights-csv", value_name = "FILE")]
    pub weights_csv: Option<PathBuf>,

    /// Log as JSON lines instead of pretty, and print JSON results
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); defaults to [logging].level, then info
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify the platform and play cues until interrupted
    Run {
        /// Item weights, overriding the config and CSV (e.g. `629,728,426`;
        /// `bottle,cap` pairs for the bottle-and-cap layout)
        #[arg(long, value_name = "LIST")]
        weights: Option<String>,
        /// Match tolerance in scaled units
        #[arg(long, value_name = "N")]
        tolerance: Option<i32>,
        /// Fixed raw tare instead of measuring one at startup
        #[arg(long, value_name = "RAW", allow_negative_numbers = true)]
        tare: Option<i32>,
        /// Stop after this many ticks
        #[arg(long, value_name = "N")]
        max_ticks: Option<u64>,
    },
    /// Tare, then print scaled weight deltas (for measuring item weights)
    Measure {
        /// Number of readings to print
        #[arg(long, default_value_t = 20)]
        ticks: u64,
    },
    /// Print the expected weight of every occupancy state
    Targets {
        /// Item weights, overriding the config and CSV
        #[arg(long, value_name = "LIST")]
        weights: Option<String>,
    },
    /// Quick health check: board, config, tracks
    SelfCheck {
        /// cpuinfo file used for board detection
        #[arg(long, value_name = "FILE", default_value = "/proc/cpuinfo")]
        cpuinfo: PathBuf,
    },
}

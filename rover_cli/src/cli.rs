//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Keeps the non-blocking file appender alive for the process lifetime.
pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "rover", version, about = "Rover control loop CLI")]
pub struct Cli {
    /// Path to config TOML; a missing file falls back to built-in defaults
    #[arg(long, value_name = "FILE", default_value = "etc/rover_config.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the control loop against the simulated robot
    Run {
        /// Stop after this many ticks (default: run until Ctrl-C)
        #[arg(long, value_name = "N")]
        max_ticks: Option<u64>,

        /// Loop pacing in Hz (overrides config; free-runs when absent)
        #[arg(long, value_name = "HZ")]
        rate_hz: Option<u32>,

        /// Apply avoidance speeds to the motors instead of display-only
        #[arg(long, action = ArgAction::SetTrue)]
        drive: bool,

        /// Simulate the calibration start press after this many button polls
        #[arg(long, value_name = "POLLS", default_value_t = 5)]
        press_after: u32,
    },
    /// Quick health check (config parses, collaborators assemble)
    SelfCheck,
}

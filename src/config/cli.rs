//! Command-line argument parsing

use clap::Parser;
use std::path::PathBuf;

/// Two-stage chip manufacturing pipeline simulator
#[derive(Parser, Debug, Clone)]
#[command(name = "chip-pipeline")]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    // ===== Production =====
    /// Number of chips the producer makes before finishing
    #[arg(short = 'n', long = "ticks", default_value_t = 10)]
    pub ticks: u64,

    /// Time between two chips, in milliseconds
    #[arg(short = 'i', long = "interval-ms", default_value_t = 2000)]
    pub interval_ms: u64,

    /// RNG seed for chip kinds (0 = random)
    #[arg(long = "seed", default_value_t = 0)]
    pub seed: u64,

    // ===== Processing =====
    /// Soldering time per cost unit, in milliseconds
    #[arg(short = 'u', long = "cost-unit-ms", default_value_t = 1000)]
    pub cost_unit_ms: u64,

    /// Upper bound on a single consumer wait, in milliseconds
    #[arg(long = "poll-timeout-ms", default_value_t = 500)]
    pub poll_timeout_ms: u64,

    // ===== Output =====
    /// Show a progress bar
    #[arg(long = "progress")]
    pub progress: bool,

    /// Write the run report as JSON
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Only print errors
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

impl CliArgs {
    /// Parse arguments from the command line
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        if self.interval_ms == 0 {
            return Err("--interval-ms must be greater than 0".to_string());
        }

        if self.poll_timeout_ms == 0 {
            return Err("--poll-timeout-ms must be greater than 0".to_string());
        }

        if self.verbose && self.quiet {
            return Err("--verbose and --quiet cannot be used together".to_string());
        }

        Ok(())
    }
}

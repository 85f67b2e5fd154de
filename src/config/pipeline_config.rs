//! Pipeline configuration derived from CLI arguments

use super::cli::CliArgs;
use std::path::PathBuf;
use std::time::Duration;

/// Complete pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    // Production
    pub ticks: u64,
    pub interval: Duration,
    pub seed: u64,

    // Processing
    pub cost_unit: Duration,
    pub poll_timeout: Duration,

    // Output
    pub progress: bool,
    pub output_path: Option<PathBuf>,
    pub quiet: bool,
}

impl PipelineConfig {
    /// Create configuration from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self, String> {
        args.validate()?;

        Ok(Self {
            ticks: args.ticks,
            interval: Duration::from_millis(args.interval_ms),
            seed: args.seed,
            cost_unit: Duration::from_millis(args.cost_unit_ms),
            poll_timeout: Duration::from_millis(args.poll_timeout_ms),
            progress: args.progress && !args.quiet,
            output_path: args.output.clone(),
            quiet: args.quiet,
        })
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "ticks": self.ticks,
            "interval_ms": self.interval.as_millis() as u64,
            "cost_unit_ms": self.cost_unit.as_millis() as u64,
            "poll_timeout_ms": self.poll_timeout.as_millis() as u64,
            "seed": self.seed,
        })
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ticks: 10,
            interval: Duration::from_secs(2),
            seed: 0,
            cost_unit: Duration::from_secs(1),
            poll_timeout: Duration::from_millis(500),
            progress: false,
            output_path: None,
            quiet: false,
        }
    }
}

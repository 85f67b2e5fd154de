//! chip-pipeline - two-stage manufacturing pipeline simulator

use anyhow::Result;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use chip_pipeline::config::{CliArgs, PipelineConfig};
use chip_pipeline::pipeline::Pipeline;

fn setup_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn print_banner(config: &PipelineConfig) {
    if config.quiet {
        return;
    }

    println!("chip-pipeline v{}", env!("CARGO_PKG_VERSION"));
    println!("====================================");
    println!("Chips: {}, Interval: {:?}", config.ticks, config.interval);
    println!(
        "Cost unit: {:?}, Poll timeout: {:?}",
        config.cost_unit, config.poll_timeout
    );
    if config.seed != 0 {
        println!("Seed: {}", config.seed);
    }
    println!("====================================\n");
}

fn run() -> Result<()> {
    let args = CliArgs::parse_args();

    setup_logging(args.verbose, args.quiet);

    let config = PipelineConfig::from_cli(&args)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    print_banner(&config);

    let pipeline = Pipeline::new(config.clone());
    let report = pipeline.run()?;

    if let Some(ref output_path) = config.output_path {
        info!("Writing report to: {:?}", output_path);
        pipeline.export_json(&report, output_path)?;
    }

    if !config.quiet {
        println!("\n====================================");
        println!("PIPELINE COMPLETE");
        println!("====================================");
        println!("Chips produced: {}", report.chips_produced);
        println!("Chips soldered: {}", report.chips_processed);
        if report.cancelled {
            println!("Cancelled, chips left: {}", report.abandoned);
        }
        println!("Duration: {:.2}s", report.duration.as_secs_f64());
        println!(
            "Consumer waits: {} raised, {} timed out, {} empty polls",
            report.wakeups, report.timeouts, report.empty_polls
        );
        println!(
            "Queue dwell: p50 {}us, p99 {}us, max {}us",
            report.dwell_p50_us, report.dwell_p99_us, report.dwell_max_us
        );
    }

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

//! Pipeline orchestration
//!
//! Wires the shared queue, signal, counters and shutdown token; launches the
//! producer and consumer on their own threads; reports progress; joins both
//! and merges their results.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use super::consumer::{Consumer, ConsumerReport};
use super::counters::PipelineCounters;
use super::producer::{Producer, ProducerReport};
use super::queue::SafeQueue;
use super::shutdown::ShutdownToken;
use super::signal::Signal;
use crate::config::PipelineConfig;
use crate::utils::{PipelineError, Result};
use crate::work::Chip;

/// Merged result of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub chips_produced: u64,
    pub chips_processed: u64,
    pub abandoned: usize,
    pub cancelled: bool,
    pub duration: Duration,
    pub producer_elapsed: Duration,
    pub wakeups: u64,
    pub timeouts: u64,
    pub closed_wakes: u64,
    pub empty_polls: u64,
    pub dwell_p50_us: u64,
    pub dwell_p99_us: u64,
    pub dwell_max_us: u64,
}

impl PipelineReport {
    fn merge(producer: ProducerReport, consumer: ConsumerReport, duration: Duration) -> Self {
        let (p50, p99, max) = if consumer.dwell.len() == 0 {
            (0, 0, 0)
        } else {
            (
                consumer.dwell.value_at_quantile(0.5),
                consumer.dwell.value_at_quantile(0.99),
                consumer.dwell.max(),
            )
        };

        Self {
            chips_produced: producer.chips_produced,
            chips_processed: consumer.chips_processed,
            abandoned: consumer.abandoned,
            cancelled: producer.stopped_early || consumer.cancelled,
            duration,
            producer_elapsed: producer.elapsed,
            wakeups: consumer.wakeups,
            timeouts: consumer.timeouts,
            closed_wakes: consumer.closed_wakes,
            empty_polls: consumer.empty_polls,
            dwell_p50_us: p50,
            dwell_p99_us: p99,
            dwell_max_us: max,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "chips_produced": self.chips_produced,
            "chips_processed": self.chips_processed,
            "abandoned": self.abandoned,
            "cancelled": self.cancelled,
            "duration_ms": self.duration.as_millis() as u64,
            "producer_elapsed_ms": self.producer_elapsed.as_millis() as u64,
            "consumer": {
                "wakeups": self.wakeups,
                "timeouts": self.timeouts,
                "closed_wakes": self.closed_wakes,
                "empty_polls": self.empty_polls,
            },
            "dwell_us": {
                "p50": self.dwell_p50_us,
                "p99": self.dwell_p99_us,
                "max": self.dwell_max_us,
            }
        })
    }
}

/// Pipeline orchestrator
pub struct Pipeline {
    config: Arc<PipelineConfig>,
    queue: Arc<SafeQueue<Chip>>,
    signal: Arc<Signal>,
    counters: Arc<PipelineCounters>,
    shutdown: ShutdownToken,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config: Arc::new(config),
            queue: Arc::new(SafeQueue::new()),
            signal: Arc::new(Signal::new()),
            counters: Arc::new(PipelineCounters::new()),
            shutdown: ShutdownToken::new(),
        }
    }

    /// Handle that cancels a run in progress
    pub fn shutdown_token(&self) -> ShutdownToken {
        self.shutdown.clone()
    }

    pub fn queue(&self) -> Arc<SafeQueue<Chip>> {
        Arc::clone(&self.queue)
    }

    pub fn counters(&self) -> Arc<PipelineCounters> {
        Arc::clone(&self.counters)
    }

    /// Run both stages to completion. A pipeline runs once.
    pub fn run(&self) -> Result<PipelineReport> {
        if self.signal.is_closed() {
            return Err(PipelineError::Config("pipeline has already run".to_string()));
        }

        let producer = Producer::new(
            Arc::clone(&self.queue),
            Arc::clone(&self.signal),
            self.shutdown.clone(),
            &self.config,
        );
        let consumer = Consumer::new(
            Arc::clone(&self.queue),
            Arc::clone(&self.signal),
            producer.status(),
            Arc::clone(&self.counters),
            self.shutdown.clone(),
            &self.config,
        )?;

        info!(
            "Starting pipeline: {} chips every {:?}, cost unit {:?}",
            self.config.ticks, self.config.interval, self.config.cost_unit
        );
        let start_time = Instant::now();

        let producer_handle = producer.start()?;
        let consumer_handle = match consumer.start() {
            Ok(handle) => handle,
            Err(e) => {
                self.shutdown.cancel();
                let _ = producer_handle.join();
                return Err(e);
            }
        };

        if self.config.progress {
            let counters = Arc::clone(&self.counters);
            let total = self.config.ticks;
            thread::spawn(move || {
                Self::report_progress(&counters, total);
            });
        }

        // A dead producer never finishes, so the consumer must be cancelled
        let producer_result = producer_handle.join();
        if producer_result.is_err() {
            warn!("Producer thread panicked, cancelling consumer");
            self.shutdown.cancel();
            self.signal.close();
        }
        let consumer_result = consumer_handle.join();

        let duration = start_time.elapsed();
        self.counters.signal_complete();

        let producer_report = producer_result
            .map_err(|_| PipelineError::Worker("producer thread panicked".to_string()))?;
        let consumer_report = consumer_result
            .map_err(|_| PipelineError::Worker("consumer thread panicked".to_string()))?;

        Ok(PipelineReport::merge(producer_report, consumer_report, duration))
    }

    /// Draw processed-chip progress until the run completes
    fn report_progress(counters: &PipelineCounters, total: u64) {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chips")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        while !counters.is_complete() {
            pb.set_position(counters.processed());
            thread::sleep(Duration::from_millis(100));
        }

        pb.set_position(counters.processed());
        pb.finish_with_message("done");
    }

    /// Write a report as pretty JSON
    pub fn export_json(&self, report: &PipelineReport, path: &Path) -> Result<()> {
        let json = serde_json::json!({
            "config": self.config.to_json(),
            "report": report.to_json(),
        });

        let mut file = File::create(path)?;
        writeln!(file, "{}", serde_json::to_string_pretty(&json)?)?;
        Ok(())
    }
}

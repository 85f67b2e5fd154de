//! Chip consumer
//!
//! Waits on the signal (bounded by the poll timeout), dequeues and solders
//! chips until the producer has finished and the queue is drained.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use hdrhistogram::Histogram;
use tracing::{debug, info, warn};

use super::counters::PipelineCounters;
use super::producer::ProducerStatus;
use super::queue::SafeQueue;
use super::shutdown::ShutdownToken;
use super::signal::{Signal, Wake};
use crate::config::PipelineConfig;
use crate::utils::{PipelineError, Result};
use crate::work::Chip;

/// Result from the consumer thread
pub struct ConsumerReport {
    pub chips_processed: u64,
    /// Waits that took a permit
    pub wakeups: u64,
    /// Waits that hit the poll timeout
    pub timeouts: u64,
    /// Waits that returned because the signal was closed
    pub closed_wakes: u64,
    /// Dequeues that came back empty
    pub empty_polls: u64,
    /// Chips left in the queue when shutdown interrupted the drain
    pub abandoned: usize,
    pub cancelled: bool,
    /// Queue dwell time per chip (microseconds)
    pub dwell: Histogram<u64>,
}

impl ConsumerReport {
    /// Loop iterations performed
    pub fn iterations(&self) -> u64 {
        self.wakeups + self.timeouts + self.closed_wakes
    }
}

/// Chip consumer (runs in a dedicated OS thread)
pub struct Consumer {
    queue: Arc<SafeQueue<Chip>>,
    signal: Arc<Signal>,
    producer: Arc<ProducerStatus>,
    counters: Arc<PipelineCounters>,
    shutdown: ShutdownToken,

    cost_unit: Duration,
    poll_timeout: Duration,

    dwell: Histogram<u64>,
}

impl Consumer {
    pub fn new(
        queue: Arc<SafeQueue<Chip>>,
        signal: Arc<Signal>,
        producer: Arc<ProducerStatus>,
        counters: Arc<PipelineCounters>,
        shutdown: ShutdownToken,
        config: &PipelineConfig,
    ) -> Result<Self> {
        let dwell = Histogram::new_with_bounds(1, 3_600_000_000, 3)
            .map_err(|e| PipelineError::Worker(format!("Failed to create histogram: {}", e)))?;

        Ok(Self {
            queue,
            signal,
            producer,
            counters,
            shutdown,
            cost_unit: config.cost_unit,
            poll_timeout: config.poll_timeout,
            dwell,
        })
    }

    /// Launch the consumer on its own thread
    pub fn start(self) -> Result<JoinHandle<ConsumerReport>> {
        thread::Builder::new()
            .name("chip-consumer".to_string())
            .spawn(move || self.run())
            .map_err(|source| PipelineError::Spawn {
                stage: "consumer",
                source,
            })
    }

    /// The producer's finished flag is loaded before the queue length; the
    /// reverse order could miss a last chip enqueued in between.
    #[inline]
    fn drained(&self) -> bool {
        self.producer.is_finished() && self.queue.is_empty()
    }

    /// Run the drain loop on the calling thread
    pub fn run(mut self) -> ConsumerReport {
        let mut processed = 0u64;
        let mut wakeups = 0u64;
        let mut timeouts = 0u64;
        let mut closed_wakes = 0u64;
        let mut empty_polls = 0u64;
        let mut cancelled = false;

        while !self.drained() {
            if self.shutdown.is_cancelled() {
                cancelled = true;
                break;
            }

            match self.signal.wait_timeout(self.poll_timeout) {
                Wake::Raised => {
                    wakeups += 1;
                    self.counters.record_wakeup();
                }
                Wake::TimedOut => {
                    timeouts += 1;
                    self.counters.record_timeout();
                    debug!("Consumer poll timed out, re-checking");
                }
                Wake::Closed => closed_wakes += 1,
            }

            // Cancel may have arrived while parked; no chip leaves the queue after it
            if self.shutdown.is_cancelled() {
                cancelled = true;
                break;
            }

            let Some(chip) = self.queue.dequeue() else {
                empty_polls += 1;
                self.counters.record_empty_poll();
                continue;
            };

            self.dwell
                .saturating_record((chip.age().as_micros() as u64).max(1));
            chip.solder(self.cost_unit);
            processed += 1;
            let total = self.counters.record_processed();
            info!("Chip {} ({}) was soldered, {} total", chip.seq(), chip.kind(), total);
        }

        let abandoned = if cancelled { self.queue.len() } else { 0 };
        if cancelled {
            warn!(
                "Soldering cancelled after {} chips, {} left in queue",
                processed, abandoned
            );
        } else {
            info!("Soldering finished: {} chips", processed);
        }

        ConsumerReport {
            chips_processed: processed,
            wakeups,
            timeouts,
            closed_wakes,
            empty_polls,
            abandoned,
            cancelled,
            dwell: self.dwell,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::producer::Producer;
    use crate::work::ChipKind;
    use std::time::Instant;

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            ticks: 0,
            interval: Duration::from_millis(1),
            cost_unit: Duration::from_millis(1),
            poll_timeout: Duration::from_millis(20),
            seed: 99,
            ..PipelineConfig::default()
        }
    }

    /// Status of a producer that has already emitted everything it will
    fn finished_status(config: &PipelineConfig) -> Arc<ProducerStatus> {
        let producer = Producer::new(
            Arc::new(SafeQueue::new()),
            Arc::new(Signal::new()),
            ShutdownToken::new(),
            config,
        );
        let status = producer.status();
        producer.run();
        assert!(status.is_finished());
        status
    }

    fn prefilled(n: u64) -> Arc<SafeQueue<Chip>> {
        let queue = Arc::new(SafeQueue::new());
        for seq in 0..n {
            queue.enqueue(Chip::new(ChipKind::ALL[(seq % 3) as usize], seq));
        }
        queue
    }

    #[test]
    fn test_drains_before_exit_when_producer_already_finished() {
        let config = test_config();
        let queue = prefilled(5);
        let counters = Arc::new(PipelineCounters::new());
        let signal = Arc::new(Signal::new());
        signal.close();

        let consumer = Consumer::new(
            Arc::clone(&queue),
            signal,
            finished_status(&config),
            Arc::clone(&counters),
            ShutdownToken::new(),
            &config,
        )
        .unwrap();

        let report = consumer.run();

        assert_eq!(report.chips_processed, 5);
        assert_eq!(counters.processed(), 5);
        assert!(queue.is_empty());
        assert!(!report.cancelled);
        assert_eq!(report.dwell.len(), 5);
    }

    #[test]
    fn test_drains_without_signals_via_timeout() {
        // Chips present but no permits raised and the signal left open:
        // the bounded wait must still let the consumer drain and exit
        let config = test_config();
        let queue = prefilled(3);

        let consumer = Consumer::new(
            Arc::clone(&queue),
            Arc::new(Signal::new()),
            finished_status(&config),
            Arc::new(PipelineCounters::new()),
            ShutdownToken::new(),
            &config,
        )
        .unwrap();

        let start = Instant::now();
        let report = consumer.run();

        assert_eq!(report.chips_processed, 3);
        assert_eq!(report.timeouts, 3);
        assert_eq!(report.wakeups, 0);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_exits_immediately_when_nothing_to_do() {
        let config = test_config();
        let queue: Arc<SafeQueue<Chip>> = Arc::new(SafeQueue::new());

        let consumer = Consumer::new(
            queue,
            Arc::new(Signal::new()),
            finished_status(&config),
            Arc::new(PipelineCounters::new()),
            ShutdownToken::new(),
            &config,
        )
        .unwrap();

        let report = consumer.run();
        assert_eq!(report.chips_processed, 0);
        assert_eq!(report.iterations(), 0);
    }

    #[test]
    fn test_cancel_reports_abandoned() {
        let config = test_config();
        let queue = prefilled(4);
        let shutdown = ShutdownToken::new();
        shutdown.cancel();

        let consumer = Consumer::new(
            Arc::clone(&queue),
            Arc::new(Signal::new()),
            finished_status(&config),
            Arc::new(PipelineCounters::new()),
            shutdown,
            &config,
        )
        .unwrap();

        let report = consumer.run();
        assert!(report.cancelled);
        assert_eq!(report.chips_processed, 0);
        assert_eq!(report.abandoned, 4);
        assert_eq!(queue.len(), 4);
    }

    #[test]
    fn test_cancel_during_wait_leaves_queue_untouched() {
        let mut config = test_config();
        config.ticks = 100;
        config.interval = Duration::from_secs(10);
        config.poll_timeout = Duration::from_secs(5);

        let queue: Arc<SafeQueue<Chip>> = Arc::new(SafeQueue::new());
        let signal = Arc::new(Signal::new());
        let shutdown = ShutdownToken::new();

        let producer = Producer::new(
            Arc::clone(&queue),
            Arc::clone(&signal),
            shutdown.clone(),
            &config,
        );
        let consumer = Consumer::new(
            Arc::clone(&queue),
            Arc::clone(&signal),
            producer.status(),
            Arc::new(PipelineCounters::new()),
            shutdown.clone(),
            &config,
        )
        .unwrap();

        let producer_handle = producer.start().unwrap();
        let consumer_handle = consumer.start().unwrap();

        // Consumer is parked in its wait with no permits; chips arrive unsignalled
        thread::sleep(Duration::from_millis(50));
        queue.enqueue(Chip::new(ChipKind::Small, 0));
        queue.enqueue(Chip::new(ChipKind::Big, 1));
        shutdown.cancel();

        let start = Instant::now();
        let report = consumer_handle.join().unwrap();
        let producer_report = producer_handle.join().unwrap();

        assert!(producer_report.stopped_early);
        assert!(report.cancelled);
        assert_eq!(report.chips_processed, 0);
        assert_eq!(report.abandoned, 2);
        assert_eq!(queue.len(), 2);
        assert!(start.elapsed() < Duration::from_secs(4));
    }
}

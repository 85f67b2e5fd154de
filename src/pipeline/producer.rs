//! Timed chip producer
//!
//! Runs `Idle -> Running -> Finished`. Each period it makes one chip,
//! enqueues it, raises the signal, then advances its tick count. After the
//! configured number of ticks (or on shutdown) it publishes `Finished` and
//! closes the signal.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::queue::SafeQueue;
use super::shutdown::ShutdownToken;
use super::signal::Signal;
use crate::config::PipelineConfig;
use crate::utils::{PipelineError, Result};
use crate::work::Chip;

/// Lifecycle of the producer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ProducerState {
    Idle = 0,
    Running = 1,
    Finished = 2,
}

impl ProducerState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => ProducerState::Idle,
            1 => ProducerState::Running,
            2 => ProducerState::Finished,
            other => unreachable!("invalid producer state byte: {}", other),
        }
    }
}

/// Producer progress, readable from any thread.
///
/// Only the producer itself can advance it.
pub struct ProducerStatus {
    state: AtomicU8,
    ticks: AtomicU64,
    stopped_early: AtomicBool,
    total_ticks: u64,
}

impl ProducerStatus {
    fn new(total_ticks: u64) -> Self {
        Self {
            state: AtomicU8::new(ProducerState::Idle as u8),
            ticks: AtomicU64::new(0),
            stopped_early: AtomicBool::new(false),
            total_ticks,
        }
    }

    pub fn state(&self) -> ProducerState {
        ProducerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Whether the producer has stopped emitting.
    ///
    /// Once this returns `true`, every chip the producer emitted is already
    /// in the queue.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.state() == ProducerState::Finished
    }

    /// Emission cycles completed so far
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Emission cycles configured
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Whether shutdown cut production short
    pub fn stopped_early(&self) -> bool {
        self.stopped_early.load(Ordering::Acquire)
    }

    fn start(&self) {
        self.state
            .store(ProducerState::Running as u8, Ordering::Release);
    }

    fn advance(&self) -> u64 {
        self.ticks.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn finish(&self, stopped_early: bool) {
        self.stopped_early.store(stopped_early, Ordering::Release);
        self.state
            .store(ProducerState::Finished as u8, Ordering::Release);
    }
}

/// Result from the producer thread
#[derive(Debug, Clone)]
pub struct ProducerReport {
    pub chips_produced: u64,
    pub stopped_early: bool,
    pub elapsed: Duration,
}

/// Chip producer (runs in a dedicated OS thread)
pub struct Producer {
    queue: Arc<SafeQueue<Chip>>,
    signal: Arc<Signal>,
    status: Arc<ProducerStatus>,
    shutdown: ShutdownToken,

    /// Thread-local RNG
    rng: fastrand::Rng,

    interval: Duration,
    total_ticks: u64,
}

impl Producer {
    pub fn new(
        queue: Arc<SafeQueue<Chip>>,
        signal: Arc<Signal>,
        shutdown: ShutdownToken,
        config: &PipelineConfig,
    ) -> Self {
        let seed = if config.seed == 0 {
            fastrand::u64(..)
        } else {
            config.seed
        };

        Self {
            queue,
            signal,
            status: Arc::new(ProducerStatus::new(config.ticks)),
            shutdown,
            rng: fastrand::Rng::with_seed(seed),
            interval: config.interval,
            total_ticks: config.ticks,
        }
    }

    /// Read-only status handle for observers
    pub fn status(&self) -> Arc<ProducerStatus> {
        Arc::clone(&self.status)
    }

    /// Launch the producer on its own thread
    pub fn start(self) -> Result<JoinHandle<ProducerReport>> {
        thread::Builder::new()
            .name("chip-producer".to_string())
            .spawn(move || self.run())
            .map_err(|source| PipelineError::Spawn {
                stage: "producer",
                source,
            })
    }

    /// Run the emission loop on the calling thread
    pub fn run(mut self) -> ProducerReport {
        let start = Instant::now();
        self.status.start();
        debug!(
            "Producer running: {} chips, one every {:?}",
            self.total_ticks, self.interval
        );

        let mut produced = 0u64;
        let mut stopped_early = false;

        while produced < self.total_ticks {
            if self.shutdown.sleep(self.interval) {
                stopped_early = true;
                break;
            }

            let chip = Chip::make(&mut self.rng, produced);
            let kind = chip.kind();

            // Enqueue must be visible before the permit is raised
            self.queue.enqueue(chip);
            self.signal.raise();
            produced = self.status.advance();

            info!(
                "Chip {} ({}) was made. Time {:.1}s",
                produced - 1,
                kind,
                start.elapsed().as_secs_f64()
            );
        }

        self.status.finish(stopped_early);
        self.signal.close();

        if stopped_early {
            warn!(
                "Generation stopped early after {} of {} chips",
                produced, self.total_ticks
            );
        } else {
            info!("Generation finished: {} chips", produced);
        }

        ProducerReport {
            chips_produced: produced,
            stopped_early,
            elapsed: start.elapsed(),
        }
    }
}

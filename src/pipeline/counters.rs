//! Shared atomic counters for progress reporting
//!
//! The consumer is the only writer; the orchestrator and the progress
//! reporter read them.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Counters shared between the consumer and observers
#[derive(Default)]
pub struct PipelineCounters {
    /// Chips soldered
    pub chips_processed: AtomicU64,

    /// Waits that took a permit
    pub wakeups: AtomicU64,

    /// Waits that hit the poll timeout
    pub timeouts: AtomicU64,

    /// Dequeues that found the queue empty
    pub empty_polls: AtomicU64,

    /// Set once both stages have been joined
    complete: AtomicBool,
}

impl PipelineCounters {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_processed(&self) -> u64 {
        self.chips_processed.fetch_add(1, Ordering::Relaxed) + 1
    }

    #[inline]
    pub fn record_wakeup(&self) {
        self.wakeups.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_empty_poll(&self) {
        self.empty_polls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn processed(&self) -> u64 {
        self.chips_processed.load(Ordering::Relaxed)
    }

    /// Signal observers that the run is over
    pub fn signal_complete(&self) {
        self.complete.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.complete.load(Ordering::Relaxed)
    }
}

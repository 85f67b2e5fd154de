//! Producer/consumer pipeline core
//!
//! - SafeQueue: lock-protected FIFO shared by both stages
//! - Signal: counting notification with bounded waits
//! - Producer: timed emitter that finishes after a fixed count
//! - Consumer: drains the queue until the producer is done and it is empty
//! - Pipeline: launches both stages and merges their results

pub mod consumer;
pub mod counters;
pub mod orchestrator;
pub mod producer;
pub mod queue;
pub mod shutdown;
pub mod signal;

pub use consumer::{Consumer, ConsumerReport};
pub use counters::PipelineCounters;
pub use orchestrator::{Pipeline, PipelineReport};
pub use producer::{Producer, ProducerReport, ProducerState, ProducerStatus};
pub use queue::{QueueStats, SafeQueue};
pub use shutdown::ShutdownToken;
pub use signal::{Signal, Wake};

//! chip-pipeline library
//!
//! Two-stage manufacturing pipeline: a timed producer makes chips, a
//! consumer solders them, and the two meet at a lock-protected queue.

pub mod config;
pub mod pipeline;
pub mod utils;
pub mod work;

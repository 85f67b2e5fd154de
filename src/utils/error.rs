//! Error types for chip-pipeline

use std::io;
use thiserror::Error;

/// Top-level pipeline error
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to spawn {stage} thread: {source}")]
    Spawn {
        stage: &'static str,
        source: io::Error,
    },

    #[error("Worker error: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Raised when a raw cost value does not name a chip kind
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Invalid chip cost: {0} (expected 1..=3)")]
pub struct InvalidCost(pub u32);

pub type Result<T> = std::result::Result<T, PipelineError>;

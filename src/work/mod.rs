//! Work items flowing through the pipeline

pub mod chip;

pub use chip::{Chip, ChipKind};

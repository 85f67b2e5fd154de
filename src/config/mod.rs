//! Configuration module

pub mod cli;
pub mod pipeline_config;

pub use cli::CliArgs;
pub use pipeline_config::PipelineConfig;

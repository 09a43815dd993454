//! CLI utilities for voicegate.
//!
//! This crate provides configuration, path and output helpers for the
//! `voicegate` binary.

pub mod config;
pub mod output;
pub mod paths;

pub use config::{
    Config, ModelBackend, ModelConfig, ServerConfig, StoreBackend, StoreConfig, load_config,
    validate_threshold,
};
pub use output::{Output, OutputFormat, print_verbose};
pub use paths::Paths;

//! Configuration module for Rivalscope
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use rivalscope::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("rivalscope.toml")).unwrap();
//! println!("Top gaps exposed: {}", config.analysis.top_gaps);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AnalysisConfig, AuditorConfig, Config, GapScope, OrchestratorConfig, OutputConfig,
    PriorityWeights, StorageBackend, StorageConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

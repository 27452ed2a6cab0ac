//! Output module for presenting comparison results
//!
//! This module handles:
//! - Writing a markdown report of a finished comparison
//! - Printing comparison and job status summaries to the terminal

mod markdown;
mod summary;

pub use markdown::{format_markdown_report, write_markdown_report};
pub use summary::{print_comparison, print_status};

use thiserror::Error;

/// Errors that can occur while producing output
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write report to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

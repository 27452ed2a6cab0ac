//! Rivalscope: competitive site audits with a ranked action plan
//!
//! This crate audits a user's site next to up to three competitors, ranks
//! them deterministically, measures per-dimension gaps and turns those gaps
//! into strategic actions with a simulated effect on the user's rank.

pub mod analysis;
pub mod audit;
pub mod config;
pub mod model;
pub mod orchestrator;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

pub use analysis::AnalysisError;
pub use audit::AuditError;
pub use output::OutputError;
pub use storage::{StorageError, StorageResult};

/// Main error type for Rivalscope operations
#[derive(Debug, Error)]
pub enum RivalError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Audit error: {0}")]
    Audit(#[from] AuditError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition {
        from: state::JobStatus,
        to: state::JobStatus,
    },

    #[error("Job not found: {0}")]
    JobNotFound(state::JobId),

    #[error("Job {job_id} cannot be cancelled while {status}")]
    NotCancellable {
        job_id: state::JobId,
        status: state::JobStatus,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Reasons a comparison request is rejected before a job is created
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Expected 1 to 3 competitor URLs, got {0}")]
    CompetitorCount(usize),

    #[error("Duplicate site URL: {url}")]
    DuplicateUrl { url: String },

    #[error("max_pages must be between 1 and {limit}, got {got}")]
    MaxPages { got: u32, limit: u32 },

    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: UrlError,
    },
}

/// Result type alias for Rivalscope operations
pub type Result<T> = std::result::Result<T, RivalError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use model::{ComparisonResult, Dimension, SiteAuditResult};
pub use orchestrator::{ComparisonService, JobResults};
pub use state::{ComparisonJob, JobId, JobStatus};
pub use url::{normalize_site_url, site_key};

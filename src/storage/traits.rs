//! Storage traits and error types
//!
//! This module defines the trait interface for job state backends and
//! associated error types.

use crate::state::{JobId, JobStatus};
use crate::storage::JobState;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    #[error("Job {id} is already {status}; terminal state cannot be overwritten")]
    TerminalState { id: JobId, status: JobStatus },

    #[error("Corrupt record for job {id}: {message}")]
    Corrupt { id: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    Poisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for job state backends
///
/// Implementations must be safe to share between the orchestrating flows of
/// concurrent jobs. Each job has a single writer, so `save` only needs to be
/// atomic per call.
pub trait ComparisonStore: Send + Sync {
    /// Inserts or replaces the state of a job
    ///
    /// Fails with [`StorageError::TerminalState`] when the stored state is
    /// terminal and differs from `state`.
    fn save(&self, state: &JobState) -> StorageResult<()>;

    /// Loads the latest state of a job
    fn load(&self, id: &JobId) -> StorageResult<JobState>;

    /// Lists every stored job, oldest first
    fn list(&self) -> StorageResult<Vec<JobState>>;
}

/// Shared write guard of both backends
pub(crate) fn check_overwrite(existing: Option<&JobState>, next: &JobState) -> StorageResult<()> {
    match existing {
        Some(current) if current.job.status.is_terminal() && current != next => {
            Err(StorageError::TerminalState {
                id: current.job.id,
                status: current.job.status,
            })
        }
        _ => Ok(()),
    }
}

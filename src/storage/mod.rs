//! Storage module for persisting job state
//!
//! This module handles job state persistence, including:
//! - The `ComparisonStore` trait the orchestrator writes through
//! - An in-memory backend for single-process use and tests
//! - A SQLite backend so finished comparisons survive the process

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{ComparisonStore, StorageError, StorageResult};

use crate::config::{StorageBackend, StorageConfig};
use crate::model::ComparisonResult;
use crate::state::ComparisonJob;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Everything stored for one job
///
/// `result` is only ever present once the job is complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobState {
    pub job: ComparisonJob,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ComparisonResult>,
}

impl JobState {
    pub fn new(job: ComparisonJob) -> Self {
        Self { job, result: None }
    }
}

/// Opens the backend selected in the configuration
pub fn open_store(config: &StorageConfig) -> StorageResult<Arc<dyn ComparisonStore>> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StorageBackend::Sqlite => {
            let path = config.database_path.as_deref().unwrap_or("rivalscope.db");
            Ok(Arc::new(SqliteStore::new(Path::new(path))?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::JobId;
    use tempfile::TempDir;

    #[test]
    fn test_open_memory_store() {
        let store = open_store(&StorageConfig::default()).unwrap();
        assert!(matches!(
            store.load(&JobId::new()),
            Err(StorageError::JobNotFound(_))
        ));
    }

    #[test]
    fn test_open_sqlite_store() {
        let dir = TempDir::new().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::Sqlite,
            database_path: Some(dir.path().join("jobs.db").to_string_lossy().into_owned()),
        };
        let store = open_store(&config).unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_job_state_json_omits_missing_result() {
        let state = JobState::new(ComparisonJob::new(
            "https://example.com/".to_string(),
            vec!["https://a.com/".to_string()],
            5,
        ));
        let json = serde_json::to_string(&state).unwrap();
        assert!(!json.contains("\"result\""));
    }
}

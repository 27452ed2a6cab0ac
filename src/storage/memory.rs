//! In-memory storage implementation

use crate::state::JobId;
use crate::storage::traits::{check_overwrite, ComparisonStore, StorageError, StorageResult};
use crate::storage::JobState;
use std::collections::HashMap;
use std::sync::RwLock;

/// Job states kept in a process-local map
#[derive(Debug, Default)]
pub struct MemoryStore {
    jobs: RwLock<HashMap<JobId, JobState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ComparisonStore for MemoryStore {
    fn save(&self, state: &JobState) -> StorageResult<()> {
        let mut jobs = self.jobs.write().map_err(|_| StorageError::Poisoned)?;
        check_overwrite(jobs.get(&state.job.id), state)?;
        jobs.insert(state.job.id, state.clone());
        Ok(())
    }

    fn load(&self, id: &JobId) -> StorageResult<JobState> {
        let jobs = self.jobs.read().map_err(|_| StorageError::Poisoned)?;
        jobs.get(id).cloned().ok_or(StorageError::JobNotFound(*id))
    }

    fn list(&self) -> StorageResult<Vec<JobState>> {
        let jobs = self.jobs.read().map_err(|_| StorageError::Poisoned)?;
        let mut states: Vec<JobState> = jobs.values().cloned().collect();
        states.sort_by(|a, b| {
            a.job
                .created_at
                .cmp(&b.job.created_at)
                .then_with(|| a.job.id.cmp(&b.job.id))
        });
        Ok(states)
    }
}

//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the ComparisonStore
//! trait. Each job is one row; the indexed columns mirror fields of the
//! serialized state so jobs can be inspected with plain SQL.

use crate::state::{JobId, JobStatus};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{check_overwrite, ComparisonStore, StorageError, StorageResult};
use crate::storage::JobState;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite storage backend
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens or creates the database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    /// Counts jobs currently in `status`
    pub fn count_by_status(&self, status: JobStatus) -> StorageResult<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM jobs WHERE status = ?1",
            params![status.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

fn read_state(conn: &Connection, id: &str) -> StorageResult<Option<JobState>> {
    let json: Option<String> = conn
        .query_row(
            "SELECT state_json FROM jobs WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;

    json.map(|json| decode(id, &json)).transpose()
}

fn decode(id: &str, json: &str) -> StorageResult<JobState> {
    serde_json::from_str(json).map_err(|e| StorageError::Corrupt {
        id: id.to_string(),
        message: e.to_string(),
    })
}

impl ComparisonStore for SqliteStore {
    fn save(&self, state: &JobState) -> StorageResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let id = state.job.id.to_string();
        check_overwrite(read_state(&tx, &id)?.as_ref(), state)?;

        let json = serde_json::to_string(state)?;
        tx.execute(
            "INSERT INTO jobs (id, status, progress, created_at, updated_at, state_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                status = excluded.status,
                progress = excluded.progress,
                updated_at = excluded.updated_at,
                state_json = excluded.state_json",
            params![
                id,
                state.job.status.to_db_string(),
                state.job.progress,
                state.job.created_at.to_rfc3339(),
                state.job.updated_at.to_rfc3339(),
                json,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn load(&self, id: &JobId) -> StorageResult<JobState> {
        let conn = self.conn()?;
        read_state(&conn, &id.to_string())?.ok_or(StorageError::JobNotFound(*id))
    }

    fn list(&self) -> StorageResult<Vec<JobState>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, state_json FROM jobs ORDER BY created_at ASC, id ASC")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut states = Vec::new();
        for row in rows {
            let (id, json) = row?;
            states.push(decode(&id, &json)?);
        }
        Ok(states)
    }
}

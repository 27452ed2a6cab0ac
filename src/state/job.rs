//! The comparison job record
//!
//! A `ComparisonJob` is mutated only by the flow orchestrating it. Every
//! mutator checks the status transition, so an illegal move surfaces as
//! [`RivalError::InvalidTransition`] instead of corrupting the record.

use crate::state::JobStatus;
use crate::RivalError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Share of the progress bar covered by the auditing phase
pub const AUDIT_PROGRESS_SHARE: u32 = 90;

/// Identifier of a comparison job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// One comparison request's full lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonJob {
    pub id: JobId,
    pub user_url: String,
    pub competitor_urls: Vec<String>,
    pub max_pages: u32,
    pub status: JobStatus,
    /// 0..=100, never decreases
    pub progress: u8,
    pub sites_completed: u32,
    pub sites_total: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl ComparisonJob {
    /// Creates a queued job for an already validated request
    pub fn new(user_url: String, competitor_urls: Vec<String>, max_pages: u32) -> Self {
        let now = Utc::now();
        let sites_total = 1 + competitor_urls.len() as u32;
        Self {
            id: JobId::new(),
            user_url,
            competitor_urls,
            max_pages,
            status: JobStatus::Queued,
            progress: 0,
            sites_completed: 0,
            sites_total,
            created_at: now,
            updated_at: now,
            completed_at: None,
            error: None,
        }
    }

    /// Every site URL in request order, user first
    pub fn site_urls(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.user_url.as_str()).chain(self.competitor_urls.iter().map(String::as_str))
    }

    pub fn begin_auditing(&mut self) -> Result<(), RivalError> {
        self.transition(JobStatus::Auditing)
    }

    /// Records that one more site audit has settled and returns the new progress
    ///
    /// Progress during auditing is `floor(sites_completed / sites_total * 90)`;
    /// the remainder is reserved for analysis.
    pub fn record_site_settled(&mut self) -> Result<u8, RivalError> {
        if self.status != JobStatus::Auditing {
            return Err(RivalError::InvalidTransition {
                from: self.status,
                to: JobStatus::Auditing,
            });
        }

        self.sites_completed = (self.sites_completed + 1).min(self.sites_total);
        let computed = self.sites_completed * AUDIT_PROGRESS_SHARE / self.sites_total.max(1);
        self.raise_progress(computed as u8);
        self.updated_at = Utc::now();
        Ok(self.progress)
    }

    pub fn begin_analysis(&mut self) -> Result<(), RivalError> {
        self.transition(JobStatus::Analyzing)?;
        self.raise_progress(AUDIT_PROGRESS_SHARE as u8);
        Ok(())
    }

    pub fn complete(&mut self) -> Result<(), RivalError> {
        self.transition(JobStatus::Complete)?;
        self.raise_progress(100);
        self.completed_at = Some(self.updated_at);
        Ok(())
    }

    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), RivalError> {
        self.transition(JobStatus::Failed)?;
        self.error = Some(error.into());
        self.completed_at = Some(self.updated_at);
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), RivalError> {
        self.transition(JobStatus::Cancelled)?;
        self.completed_at = Some(self.updated_at);
        Ok(())
    }

    /// Snapshot of the fields exposed by `status`
    pub fn status_view(&self) -> JobStatusView {
        JobStatusView {
            id: self.id,
            status: self.status,
            progress: self.progress,
            sites_completed: self.sites_completed,
            sites_total: self.sites_total,
            error: self.error.clone(),
        }
    }

    fn transition(&mut self, next: JobStatus) -> Result<(), RivalError> {
        if !self.status.can_transition_to(next) {
            return Err(RivalError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    fn raise_progress(&mut self, value: u8) {
        self.progress = self.progress.max(value.min(100));
    }
}

/// Progress snapshot returned to callers polling a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatusView {
    pub id: JobId,
    pub status: JobStatus,
    pub progress: u8,
    pub sites_completed: u32,
    pub sites_total: u32,
    pub error: Option<String>,
}

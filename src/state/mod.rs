//! State module for tracking comparison jobs
//!
//! # Components
//!
//! - `JobStatus`: the lifecycle states of a job and their legal transitions
//! - `ComparisonJob`: the job record the orchestrating flow mutates
//! - `JobStatusView`: the progress snapshot returned to callers

mod job;
mod job_status;

pub use job::{ComparisonJob, JobId, JobStatusView, AUDIT_PROGRESS_SHARE};
pub use job_status::JobStatus;

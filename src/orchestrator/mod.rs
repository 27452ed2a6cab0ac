//! Orchestrator module for running comparison jobs
//!
//! This module contains:
//! - `AuditOrchestrator`: concurrent per-site audits under a job deadline,
//!   followed by analysis
//! - `ComparisonService`: request validation and the job-facing operations
//! - `CancelToken`: the signal a cancel request sends to a running job

mod cancel;
mod coordinator;
mod service;

pub use cancel::CancelToken;
pub use coordinator::AuditOrchestrator;
pub use service::{ComparisonRequest, ComparisonService, JobResults, MAX_COMPETITORS};

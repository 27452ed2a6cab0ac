//! Fixed-shape records exchanged between the pipeline stages
//!
//! # Components
//!
//! - `site`: what an auditor produces for one URL
//! - `analysis`: rankings, gaps, actions and the final comparison result

mod analysis;
mod site;

pub use analysis::{
    ComparativeGap, ComparisonResult, ComparisonSummary, Effort, GapPriority, QuickWinEmptyReason,
    QuickWinSelection, RankingEntry, SiteFailure, StrategicAction,
};
pub use site::{
    AuditIssue, AuditOutcome, CrawlMetadata, Dimension, DimensionScore, FailureReason,
    SiteAuditResult, SiteRole,
};

/// Job status definitions for tracking a comparison's lifecycle
///
/// This module defines every state a comparison job can be in and the legal
/// transitions between them.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the current state of a comparison job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    // ===== Active States =====
    /// Job accepted, audits not started yet
    Queued,

    /// Per-site audits are running
    Auditing,

    /// All audits settled; rankings, gaps and strategy are being derived
    Analyzing,

    // ===== Terminal States =====
    /// Analysis finished and the result is attached
    Complete,

    /// Every audit failed, or analysis failed
    Failed,

    /// Cancelled by the caller before analysis started
    Cancelled,
}

impl JobStatus {
    /// Returns true if this is a terminal state (no further mutation allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed | Self::Cancelled)
    }

    /// Returns true if a cancellation request can still take effect
    ///
    /// Analysis is short and pure, so only jobs that have not reached it yet
    /// can be cancelled.
    pub fn is_cancellable(&self) -> bool {
        matches!(self, Self::Queued | Self::Auditing)
    }

    /// Checks whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Queued, Auditing)
                | (Queued, Cancelled)
                | (Queued, Failed)
                | (Auditing, Analyzing)
                | (Auditing, Failed)
                | (Auditing, Cancelled)
                | (Analyzing, Complete)
                | (Analyzing, Failed)
        )
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Auditing => "auditing",
            Self::Analyzing => "analyzing",
            Self::Complete => "complete",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(Self::Queued),
            "auditing" => Some(Self::Auditing),
            "analyzing" => Some(Self::Analyzing),
            "complete" => Some(Self::Complete),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns all possible job statuses
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Queued,
            Self::Auditing,
            Self::Analyzing,
            Self::Complete,
            Self::Failed,
            Self::Cancelled,
        ]
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

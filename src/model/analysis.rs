//! Records derived by the analysis pipeline

use crate::model::site::{Dimension, FailureReason, SiteAuditResult, SiteRole};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// One row of the ranking table
///
/// Succeeded sites carry a rank in `1..=k`; failed sites carry neither rank
/// nor score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub url: String,
    pub role: SiteRole,
    pub score: Option<u32>,
    pub rank: Option<u32>,
}

/// A site whose audit failed, reported next to the ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteFailure {
    pub url: String,
    pub role: SiteRole,
    pub reason: FailureReason,
}

/// Headline numbers of a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub user_url: String,
    pub user_score: Option<u32>,
    pub user_rank: Option<u32>,
    pub top_score: Option<u32>,
    /// `max(0, top_score - user_score)`; 0 when the user was not ranked
    pub score_gap_to_first: u32,
    pub highest_competitor_score: Option<u32>,
    pub lowest_competitor_score: Option<u32>,
    pub average_competitor_score: Option<f64>,
    pub sites_ranked: usize,
    pub sites_failed: usize,
}

/// Priority tier of a gap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GapPriority {
    High,
    Medium,
}

impl fmt::Display for GapPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => f.write_str("high"),
            Self::Medium => f.write_str("medium"),
        }
    }
}

/// Point deficit between the user and one competitor in one dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparativeGap {
    pub dimension: Dimension,
    pub user_score: u32,
    pub competitor_score: u32,
    pub competitor_url: String,
    /// Always greater than zero
    pub gap_magnitude: u32,
    pub priority: GapPriority,
}

/// Relative cost of carrying out an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Effort {
    Low,
    Medium,
    High,
}

impl fmt::Display for Effort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => f.write_str("low"),
            Self::Medium => f.write_str("medium"),
            Self::High => f.write_str("high"),
        }
    }
}

/// A ranked recommendation with its simulated effect on the user's rank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategicAction {
    pub description: String,
    pub dimension: Dimension,
    /// Points gained; never more than the dimension's remaining headroom
    pub estimated_impact: u32,
    pub effort: Effort,
    /// Competitors the user would overtake
    pub beats: BTreeSet<String>,
    pub current_rank: u32,
    /// Always `<= current_rank`
    pub potential_rank: u32,
    pub priority_score: f64,
}

impl StrategicAction {
    /// Number of places gained if the action is completed
    pub fn rank_improvement(&self) -> u32 {
        self.current_rank.saturating_sub(self.potential_rank)
    }
}

/// Why a quick-win selection came back empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuickWinEmptyReason {
    /// The strategy produced no actions at all
    NoActions,
    /// No action is low effort
    NoLowEffort,
    /// Low-effort actions exist but none improves the user's rank
    NoRankImprovement,
}

impl fmt::Display for QuickWinEmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoActions => f.write_str("no strategic actions were generated"),
            Self::NoLowEffort => f.write_str("no action is low effort"),
            Self::NoRankImprovement => {
                f.write_str("no low-effort action improves the current rank")
            }
        }
    }
}

/// Output of the quick-win selector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickWinSelection {
    pub actions: Vec<StrategicAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_reason: Option<QuickWinEmptyReason>,
}

/// Complete analysis attached to a finished job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub user_url: String,
    pub rankings: Vec<RankingEntry>,
    pub failures: Vec<SiteFailure>,
    pub summary: ComparisonSummary,
    /// The highest-magnitude gaps (top-K)
    pub gaps: Vec<ComparativeGap>,
    /// Number of gaps found before the top-K cut
    pub total_gaps: usize,
    pub strategy: Vec<StrategicAction>,
    pub quick_wins: QuickWinSelection,
    /// Per-site results in request order, user first
    pub sites: Vec<SiteAuditResult>,
}

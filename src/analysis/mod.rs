//! Analysis module: the pure pipeline run once every audit has settled
//!
//! This module contains:
//! - Deterministic ranking and summary statistics
//! - Per-dimension gap detection with priority tiers
//! - Strategy generation with rank simulation
//! - Quick-win selection
//!
//! Nothing here performs I/O or reads the clock, so the same audit results
//! always produce the same [`ComparisonResult`].

mod comparator;
mod effort;
mod gaps;
mod quick_wins;
mod strategy;

pub use comparator::{compare, Ranking};
pub use effort::EffortPolicy;
pub use gaps::{find_gaps, gap_targets};
pub use quick_wins::select;
pub use strategy::{generate, StrategyPolicy};

use crate::config::{AnalysisConfig, GapScope};
use crate::model::{
    ComparisonResult, QuickWinEmptyReason, QuickWinSelection, SiteAuditResult, SiteRole,
};
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

/// Errors raised by the analysis pipeline
///
/// Any of these is fatal for the job it occurs in.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid analysis input: {0}")]
    InvalidInput(String),

    #[error("No site audit succeeded")]
    NoSuccessfulAudits,

    #[error("Analysis invariant violated: {0}")]
    InvariantViolation(String),
}

/// Tunable policy of the pipeline
#[derive(Debug, Clone)]
pub struct AnalysisPolicy {
    pub high_priority_fraction: f64,
    pub top_gaps: usize,
    pub quick_win_limit: usize,
    pub gap_scope: GapScope,
    pub strategy: StrategyPolicy,
}

impl Default for AnalysisPolicy {
    fn default() -> Self {
        Self::from(&AnalysisConfig::default())
    }
}

impl From<&AnalysisConfig> for AnalysisPolicy {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            high_priority_fraction: config.high_priority_fraction,
            top_gaps: config.top_gaps,
            quick_win_limit: config.quick_win_limit,
            gap_scope: config.gap_scope,
            strategy: StrategyPolicy {
                effort: EffortPolicy::with_overrides(&config.effort),
                weights: config.weights.clone(),
            },
        }
    }
}

/// Runs compare, gap analysis, strategy generation and quick-win selection
///
/// `results` must hold exactly one user site and unique URLs. The order of
/// `results` is preserved in `ComparisonResult::sites` but has no effect on
/// any derived value.
pub fn analyze(
    results: &[SiteAuditResult],
    policy: &AnalysisPolicy,
) -> Result<ComparisonResult, AnalysisError> {
    check_input(results)?;

    let ranking = compare(results);

    let user = results.iter().find(|r| r.role == SiteRole::User && r.is_success());
    let competitors: Vec<&SiteAuditResult> = results
        .iter()
        .filter(|r| r.role == SiteRole::Competitor && r.is_success())
        .collect();

    let (all_gaps, strategy) = match user {
        Some(user) => {
            let targets = gap_targets(user, &competitors, policy.gap_scope);
            let gaps = find_gaps(user, &targets, policy.high_priority_fraction);
            let strategy = generate(user, &competitors, &gaps, &policy.strategy);
            (gaps, strategy)
        }
        None => {
            debug!("User site was not audited, skipping gap analysis");
            (Vec::new(), Vec::new())
        }
    };

    let quick_wins = if strategy.is_empty() {
        QuickWinSelection {
            actions: Vec::new(),
            empty_reason: Some(QuickWinEmptyReason::NoActions),
        }
    } else {
        select(&strategy, policy.quick_win_limit)
    };

    let total_gaps = all_gaps.len();
    let gaps = all_gaps.into_iter().take(policy.top_gaps).collect();

    let user_url = ranking.summary.user_url.clone();
    let result = ComparisonResult {
        user_url,
        rankings: ranking.entries,
        failures: ranking.failures,
        summary: ranking.summary,
        gaps,
        total_gaps,
        strategy,
        quick_wins,
        sites: results.to_vec(),
    };

    verify(&result)?;

    debug!(
        ranked = result.summary.sites_ranked,
        gaps = result.total_gaps,
        actions = result.strategy.len(),
        quick_wins = result.quick_wins.actions.len(),
        "Analysis finished"
    );

    Ok(result)
}

fn check_input(results: &[SiteAuditResult]) -> Result<(), AnalysisError> {
    let users = results.iter().filter(|r| r.role == SiteRole::User).count();
    if users != 1 {
        return Err(AnalysisError::InvalidInput(format!(
            "expected exactly one user site, got {}",
            users
        )));
    }

    let mut seen = HashSet::new();
    for result in results {
        if !seen.insert(result.url.as_str()) {
            return Err(AnalysisError::InvalidInput(format!(
                "duplicate site {}",
                result.url
            )));
        }
    }

    if !results.iter().any(|r| r.is_success()) {
        return Err(AnalysisError::NoSuccessfulAudits);
    }

    Ok(())
}

/// Re-checks the structural guarantees of a result before it is exposed
fn verify(result: &ComparisonResult) -> Result<(), AnalysisError> {
    let ranks: Vec<u32> = result.rankings.iter().filter_map(|e| e.rank).collect();
    let succeeded = result.sites.iter().filter(|s| s.is_success()).count();
    if ranks.len() != succeeded {
        return Err(AnalysisError::InvariantViolation(format!(
            "{} ranked entries for {} succeeded sites",
            ranks.len(),
            succeeded
        )));
    }
    for (index, rank) in ranks.iter().enumerate() {
        if *rank != index as u32 + 1 {
            return Err(AnalysisError::InvariantViolation(format!(
                "ranks are not contiguous: {:?}",
                ranks
            )));
        }
    }

    if let Some(gap) = result.gaps.iter().find(|g| g.gap_magnitude == 0) {
        return Err(AnalysisError::InvariantViolation(format!(
            "zero-magnitude gap for {} against {}",
            gap.dimension, gap.competitor_url
        )));
    }

    if let Some(action) = result
        .strategy
        .iter()
        .find(|a| a.potential_rank > a.current_rank)
    {
        return Err(AnalysisError::InvariantViolation(format!(
            "action on {} would move the user from rank {} to {}",
            action.dimension, action.current_rank, action.potential_rank
        )));
    }

    Ok(())
}

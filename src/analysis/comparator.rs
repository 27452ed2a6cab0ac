//! Score comparator: deterministic ranking and summary statistics
//!
//! Succeeded sites are ordered by total score descending. Ties fall back to
//! the SEO dimension, then the AEO dimension (both descending), then the URL
//! ascending. Because URLs within a job are distinct the order is total, so
//! identical inputs always produce identical rankings.

use crate::model::{
    ComparisonSummary, Dimension, RankingEntry, SiteAuditResult, SiteFailure, SiteRole,
};
use std::cmp::Ordering;

/// The fields the ranking rule looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RankKey<'a> {
    pub url: &'a str,
    pub total: u32,
    pub seo: u32,
    pub aeo: u32,
}

impl<'a> RankKey<'a> {
    pub fn of(result: &'a SiteAuditResult) -> Self {
        Self {
            url: &result.url,
            total: result.total_score,
            seo: result.dimension_score(Dimension::Seo),
            aeo: result.dimension_score(Dimension::Aeo),
        }
    }

    /// The same site with `points` added to its total and to `dimension`
    pub fn boosted(self, dimension: Dimension, points: u32) -> Self {
        Self {
            total: self.total + points,
            seo: if dimension == Dimension::Seo {
                self.seo + points
            } else {
                self.seo
            },
            aeo: if dimension == Dimension::Aeo {
                self.aeo + points
            } else {
                self.aeo
            },
            ..self
        }
    }
}

/// Ranking order: `Less` means `a` ranks ahead of `b`
pub(crate) fn ranking_order(a: &RankKey<'_>, b: &RankKey<'_>) -> Ordering {
    b.total
        .cmp(&a.total)
        .then_with(|| b.seo.cmp(&a.seo))
        .then_with(|| b.aeo.cmp(&a.aeo))
        .then_with(|| a.url.cmp(b.url))
}

/// Rank `site` would hold among `others` (1 is best)
pub(crate) fn rank_among(site: &RankKey<'_>, others: &[RankKey<'_>]) -> u32 {
    1 + others
        .iter()
        .filter(|other| other.url != site.url && ranking_order(other, site) == Ordering::Less)
        .count() as u32
}

/// Output of [`compare`]
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    /// Ranked sites first (rank 1..k), then failed sites in input order
    pub entries: Vec<RankingEntry>,
    pub failures: Vec<SiteFailure>,
    pub summary: ComparisonSummary,
}

impl Ranking {
    /// Rank of a URL, if it was ranked
    pub fn rank_of(&self, url: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|entry| entry.url == url)
            .and_then(|entry| entry.rank)
    }
}

/// Ranks the succeeded sites and summarizes the comparison
///
/// Failed sites never receive a rank; they are appended to the ranking table
/// without score and listed in `failures`.
///
/// # Example
///
/// ```
/// use rivalscope::analysis::compare;
/// use rivalscope::model::{Dimension, DimensionScore, SiteAuditResult, SiteRole};
/// use std::collections::BTreeMap;
///
/// let site = |url: &str, role, seo| {
///     let mut dims = BTreeMap::new();
///     dims.insert(Dimension::Seo, DimensionScore::new(seo, 100));
///     SiteAuditResult::succeeded(url, role, dims)
/// };
/// let ranking = compare(&[
///     site("https://example.com/", SiteRole::User, 65),
///     site("https://a.com/", SiteRole::Competitor, 78),
/// ]);
/// assert_eq!(ranking.summary.user_rank, Some(2));
/// assert_eq!(ranking.summary.score_gap_to_first, 13);
/// ```
pub fn compare(results: &[SiteAuditResult]) -> Ranking {
    let mut succeeded: Vec<&SiteAuditResult> = results.iter().filter(|r| r.is_success()).collect();
    succeeded.sort_by(|a, b| ranking_order(&RankKey::of(a), &RankKey::of(b)));

    let mut entries: Vec<RankingEntry> = succeeded
        .iter()
        .enumerate()
        .map(|(index, result)| RankingEntry {
            url: result.url.clone(),
            role: result.role,
            score: Some(result.total_score),
            rank: Some(index as u32 + 1),
        })
        .collect();

    let failures: Vec<SiteFailure> = results
        .iter()
        .filter_map(|result| {
            result.failure_reason().map(|reason| SiteFailure {
                url: result.url.clone(),
                role: result.role,
                reason: reason.clone(),
            })
        })
        .collect();

    entries.extend(failures.iter().map(|failure| RankingEntry {
        url: failure.url.clone(),
        role: failure.role,
        score: None,
        rank: None,
    }));

    let summary = summarize(results, &entries, failures.len());

    Ranking {
        entries,
        failures,
        summary,
    }
}

fn summarize(
    results: &[SiteAuditResult],
    entries: &[RankingEntry],
    sites_failed: usize,
) -> ComparisonSummary {
    let user_url = results
        .iter()
        .find(|r| r.role == SiteRole::User)
        .map(|r| r.url.clone())
        .unwrap_or_default();

    let user_entry = entries
        .iter()
        .find(|e| e.role == SiteRole::User && e.rank.is_some());
    let user_score = user_entry.and_then(|e| e.score);
    let user_rank = user_entry.and_then(|e| e.rank);
    let top_score = entries.first().and_then(|e| e.score);

    let score_gap_to_first = match (top_score, user_score) {
        (Some(top), Some(user)) => top.saturating_sub(user),
        _ => 0,
    };

    let competitor_scores: Vec<u32> = entries
        .iter()
        .filter(|e| e.role == SiteRole::Competitor)
        .filter_map(|e| e.score)
        .collect();

    let average_competitor_score = if competitor_scores.is_empty() {
        None
    } else {
        let sum: u64 = competitor_scores.iter().map(|&s| s as u64).sum();
        Some(sum as f64 / competitor_scores.len() as f64)
    };

    ComparisonSummary {
        user_url,
        user_score,
        user_rank,
        top_score,
        score_gap_to_first,
        highest_competitor_score: competitor_scores.iter().copied().max(),
        lowest_competitor_score: competitor_scores.iter().copied().min(),
        average_competitor_score,
        sites_ranked: entries.iter().filter(|e| e.rank.is_some()).count(),
        sites_failed,
    }
}

//! Strategy generator: turns gaps into ranked, effort-tagged actions
//!
//! Gaps are clustered by dimension and each cluster becomes one action sized
//! by its largest gap, capped by the user's remaining headroom. The user's
//! rank after the fix is found by re-running the ranking rule with the
//! boosted score against the unmodified competitors.

use crate::analysis::comparator::{rank_among, ranking_order, RankKey};
use crate::analysis::effort::EffortPolicy;
use crate::config::PriorityWeights;
use crate::model::{ComparativeGap, Dimension, SiteAuditResult, StrategicAction};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Policy inputs of [`generate`]
#[derive(Debug, Clone)]
pub struct StrategyPolicy {
    pub effort: EffortPolicy,
    pub weights: PriorityWeights,
}

impl Default for StrategyPolicy {
    fn default() -> Self {
        Self {
            effort: EffortPolicy::default(),
            weights: PriorityWeights::default(),
        }
    }
}

/// Builds one strategic action per dimension with at least one gap
///
/// `competitors` is the full set of succeeded competitors used for rank
/// simulation, which may be wider than the set the gaps were measured
/// against. The output is sorted by priority score descending.
pub fn generate(
    user: &SiteAuditResult,
    competitors: &[&SiteAuditResult],
    gaps: &[ComparativeGap],
    policy: &StrategyPolicy,
) -> Vec<StrategicAction> {
    let competitor_keys: Vec<RankKey<'_>> = competitors
        .iter()
        .filter(|c| c.is_success())
        .map(|c| RankKey::of(c))
        .collect();
    let user_key = RankKey::of(user);
    let current_rank = rank_among(&user_key, &competitor_keys);

    let mut clusters: BTreeMap<Dimension, &ComparativeGap> = BTreeMap::new();
    for gap in gaps {
        let widest = clusters.entry(gap.dimension).or_insert(gap);
        if gap.gap_magnitude > widest.gap_magnitude
            || (gap.gap_magnitude == widest.gap_magnitude
                && gap.competitor_url < widest.competitor_url)
        {
            *widest = gap;
        }
    }

    let mut actions: Vec<StrategicAction> = clusters
        .into_iter()
        .filter_map(|(dimension, gap)| {
            let headroom = headroom(user, dimension, competitors);
            let estimated_impact = gap.gap_magnitude.min(headroom);
            if estimated_impact == 0 {
                return None;
            }

            let simulated = user_key.boosted(dimension, estimated_impact);
            let potential_rank = rank_among(&simulated, &competitor_keys).min(current_rank);

            let beats: BTreeSet<String> = competitor_keys
                .iter()
                .filter(|c| ranking_order(c, &user_key) == Ordering::Less)
                .filter(|c| ranking_order(&simulated, c) == Ordering::Less)
                .map(|c| c.url.to_string())
                .collect();

            let effort = policy.effort.effort_for(dimension);
            let improvement = current_rank - potential_rank;
            let priority_score = estimated_impact as f64 * policy.weights.impact
                + improvement as f64 * policy.weights.rank
                - policy.weights.effort_penalty(effort);

            Some(StrategicAction {
                description: describe(dimension, gap, estimated_impact, &beats),
                dimension,
                estimated_impact,
                effort,
                beats,
                current_rank,
                potential_rank,
                priority_score,
            })
        })
        .collect();

    actions.sort_by(|a, b| {
        b.priority_score
            .total_cmp(&a.priority_score)
            .then_with(|| b.estimated_impact.cmp(&a.estimated_impact))
            .then_with(|| a.dimension.cmp(&b.dimension))
    });

    actions
}

/// Points the user can still gain in a dimension
///
/// When the user's audit did not score the dimension, the competitors'
/// maximum for it stands in for the rubric ceiling.
fn headroom(user: &SiteAuditResult, dimension: Dimension, competitors: &[&SiteAuditResult]) -> u32 {
    match user.dimensions.get(&dimension) {
        Some(score) => score.headroom(),
        None => competitors
            .iter()
            .filter_map(|c| c.dimensions.get(&dimension))
            .map(|s| s.max)
            .max()
            .unwrap_or(0),
    }
}

fn describe(
    dimension: Dimension,
    gap: &ComparativeGap,
    impact: u32,
    beats: &BTreeSet<String>,
) -> String {
    let mut description = format!(
        "{} to gain up to {} {} points and close the {}-point gap with {}",
        playbook(dimension),
        impact,
        dimension.label(),
        gap.gap_magnitude,
        gap.competitor_url
    );
    if !beats.is_empty() {
        let names: Vec<&str> = beats.iter().map(String::as_str).collect();
        description.push_str(&format!("; overtakes {}", names.join(", ")));
    }
    description
}

fn playbook(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Seo => "Rewrite page titles, meta descriptions and H1 headings",
        Dimension::Aeo => "Answer common questions directly with question headings and FAQ sections",
        Dimension::StructuredData => "Add JSON-LD schema markup and Open Graph tags",
        Dimension::Content => "Expand thin pages into in-depth, well-structured content",
        Dimension::Technical => "Serve every page over HTTPS with a mobile viewport and fix failing URLs",
        Dimension::LinkProfile => "Strengthen internal linking and cite authoritative sources",
    }
}

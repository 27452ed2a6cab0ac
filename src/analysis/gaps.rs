//! Gap analyzer: per-dimension point deficits against competitors

use crate::analysis::comparator::{ranking_order, RankKey};
use crate::config::GapScope;
use crate::model::{ComparativeGap, Dimension, GapPriority, SiteAuditResult};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Picks the competitors gaps are measured against
///
/// With [`GapScope::All`] every succeeded competitor is a target, except
/// when the user's total is strictly above every competitor's total: a user
/// who leads the field has nothing to close. [`GapScope::Outranking`] keeps
/// only the competitors ranked ahead of the user. Failed audits are always
/// dropped.
pub fn gap_targets<'a>(
    user: &SiteAuditResult,
    competitors: &[&'a SiteAuditResult],
    scope: GapScope,
) -> Vec<&'a SiteAuditResult> {
    let succeeded = competitors.iter().copied().filter(|c| c.is_success());
    match scope {
        GapScope::All => {
            let targets: Vec<&SiteAuditResult> = succeeded.collect();
            if targets.iter().all(|c| user.total_score > c.total_score) {
                return Vec::new();
            }
            targets
        }
        GapScope::Outranking => {
            let user_key = RankKey::of(user);
            succeeded
                .filter(|c| ranking_order(&RankKey::of(c), &user_key) == Ordering::Less)
                .collect()
        }
    }
}

/// Finds every dimension in which a competitor outscores the user
///
/// One gap is kept per (dimension, competitor) pair, the largest one seen. A
/// gap is high priority when it is at least `high_priority_fraction` of the
/// dimension's maximum score, or when its magnitude equals the largest gap
/// found. Gaps tied at the largest magnitude are all high priority.
///
/// The result is sorted by magnitude descending; ties are ordered by
/// dimension and then competitor URL.
pub fn find_gaps(
    user: &SiteAuditResult,
    competitors: &[&SiteAuditResult],
    high_priority_fraction: f64,
) -> Vec<ComparativeGap> {
    // (dimension, competitor) -> (gap, dimension max)
    let mut largest: BTreeMap<(Dimension, &str), (ComparativeGap, u32)> = BTreeMap::new();

    for competitor in competitors.iter().filter(|c| c.is_success()) {
        for (&dimension, competitor_score) in &competitor.dimensions {
            let user_score = user.dimension_score(dimension);
            if competitor_score.current <= user_score {
                continue;
            }

            let dimension_max = user
                .dimensions
                .get(&dimension)
                .map(|s| s.max)
                .unwrap_or(competitor_score.max);
            let gap = ComparativeGap {
                dimension,
                user_score,
                competitor_score: competitor_score.current,
                competitor_url: competitor.url.clone(),
                gap_magnitude: competitor_score.current - user_score,
                priority: GapPriority::Medium,
            };

            let key = (dimension, competitor.url.as_str());
            let replace = largest
                .get(&key)
                .map_or(true, |(existing, _)| gap.gap_magnitude > existing.gap_magnitude);
            if replace {
                largest.insert(key, (gap, dimension_max));
            }
        }
    }

    let mut ranked: Vec<(ComparativeGap, u32)> = largest.into_values().collect();
    ranked.sort_by(|(a, _), (b, _)| {
        b.gap_magnitude
            .cmp(&a.gap_magnitude)
            .then_with(|| a.dimension.cmp(&b.dimension))
            .then_with(|| a.competitor_url.cmp(&b.competitor_url))
    });

    let largest_magnitude = ranked.first().map_or(0, |(gap, _)| gap.gap_magnitude);
    ranked
        .into_iter()
        .map(|(mut gap, dimension_max)| {
            let threshold = high_priority_fraction * dimension_max as f64;
            gap.priority = if gap.gap_magnitude == largest_magnitude
                || gap.gap_magnitude as f64 >= threshold
            {
                GapPriority::High
            } else {
                GapPriority::Medium
            };
            gap
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{scored, site};
    use crate::model::{FailureReason, SiteRole};

    #[test]
    fn test_gap_only_when_competitor_strictly_ahead() {
        let user = scored("https://u.com/", SiteRole::User, &[(Dimension::Seo, 20, 25), (Dimension::Aeo, 10, 20)]);
        let rival = scored(
            "https://a.com/",
            SiteRole::Competitor,
            &[(Dimension::Seo, 20, 25), (Dimension::Aeo, 16, 20)],
        );

        let gaps = find_gaps(&user, &[&rival], 0.2);

        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].dimension, Dimension::Aeo);
        assert_eq!(gaps[0].gap_magnitude, 6);
        assert_eq!(gaps[0].user_score, 10);
        assert_eq!(gaps[0].competitor_score, 16);
        assert_eq!(gaps[0].competitor_url, "https://a.com/");
    }

    #[test]
    fn test_priority_threshold_and_largest() {
        let user = scored(
            "https://u.com/",
            SiteRole::User,
            &[
                (Dimension::Seo, 10, 25),
                (Dimension::Content, 10, 15),
                (Dimension::LinkProfile, 5, 10),
            ],
        );
        let rival = scored(
            "https://a.com/",
            SiteRole::Competitor,
            &[
                (Dimension::Seo, 22, 25),
                (Dimension::Content, 12, 15),
                (Dimension::LinkProfile, 7, 10),
            ],
        );

        let gaps = find_gaps(&user, &[&rival], 0.2);
        let summary: Vec<(Dimension, u32, GapPriority)> = gaps
            .iter()
            .map(|g| (g.dimension, g.gap_magnitude, g.priority))
            .collect();

        assert_eq!(
            summary,
            vec![
                // largest gap overall
                (Dimension::Seo, 12, GapPriority::High),
                // 2 < 0.2 * 15 = 3
                (Dimension::Content, 2, GapPriority::Medium),
                // 2 >= 0.2 * 10 = 2
                (Dimension::LinkProfile, 2, GapPriority::High),
            ]
        );
    }

    #[test]
    fn test_single_largest_gap_is_high_even_below_threshold() {
        let user = scored("https://u.com/", SiteRole::User, &[(Dimension::Seo, 20, 25)]);
        let rival = scored("https://a.com/", SiteRole::Competitor, &[(Dimension::Seo, 21, 25)]);

        let gaps = find_gaps(&user, &[&rival], 0.5);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].priority, GapPriority::High);
    }

    #[test]
    fn test_gaps_tied_at_largest_are_all_high() {
        let user = scored(
            "https://u.com/",
            SiteRole::User,
            &[(Dimension::Seo, 20, 100), (Dimension::Aeo, 20, 100)],
        );
        let rival = scored(
            "https://a.com/",
            SiteRole::Competitor,
            &[(Dimension::Seo, 23, 100), (Dimension::Aeo, 23, 100)],
        );

        // 3 < 0.5 * 100, so only the tie at the largest magnitude qualifies
        let gaps = find_gaps(&user, &[&rival], 0.5);
        assert_eq!(gaps.len(), 2);
        assert!(gaps.iter().all(|g| g.gap_magnitude == 3));
        assert!(gaps.iter().all(|g| g.priority == GapPriority::High));
    }

    #[test]
    fn test_one_gap_per_dimension_and_competitor() {
        let user = scored("https://u.com/", SiteRole::User, &[(Dimension::Seo, 5, 25)]);
        let a = scored("https://a.com/", SiteRole::Competitor, &[(Dimension::Seo, 15, 25)]);
        let b = scored("https://b.com/", SiteRole::Competitor, &[(Dimension::Seo, 15, 25)]);

        // The same competitor passed twice still yields one gap
        let gaps = find_gaps(&user, &[&a, &b, &a], 0.2);
        assert_eq!(gaps.len(), 2);
        assert_eq!(gaps[0].competitor_url, "https://a.com/");
        assert_eq!(gaps[1].competitor_url, "https://b.com/");
    }

    #[test]
    fn test_missing_user_dimension_counts_as_zero() {
        let user = scored("https://u.com/", SiteRole::User, &[(Dimension::Seo, 5, 25)]);
        let rival = scored(
            "https://a.com/",
            SiteRole::Competitor,
            &[(Dimension::StructuredData, 9, 15)],
        );

        let gaps = find_gaps(&user, &[&rival], 0.2);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].user_score, 0);
        assert_eq!(gaps[0].gap_magnitude, 9);
    }

    #[test]
    fn test_failed_competitor_ignored() {
        let user = scored("https://u.com/", SiteRole::User, &[(Dimension::Seo, 5, 25)]);
        let failed = SiteAuditResult::failed(
            "https://a.com/",
            SiteRole::Competitor,
            FailureReason::Timeout,
        );
        assert!(find_gaps(&user, &[&failed], 0.2).is_empty());
    }

    #[test]
    fn test_gap_targets_scope() {
        let user = site("https://u.com/", SiteRole::User, 60, 20, 10);
        let ahead = site("https://a.com/", SiteRole::Competitor, 70, 20, 10);
        let behind = site("https://b.com/", SiteRole::Competitor, 50, 20, 10);
        let competitors = [&ahead, &behind];

        let all = gap_targets(&user, &competitors, GapScope::All);
        assert_eq!(all.len(), 2);

        let outranking = gap_targets(&user, &competitors, GapScope::Outranking);
        assert_eq!(outranking.len(), 1);
        assert_eq!(outranking[0].url, "https://a.com/");
    }

    #[test]
    fn test_lower_ranked_competitor_leading_a_dimension_yields_gap() {
        let user = site("https://u.com/", SiteRole::User, 65, 10, 20);
        let ahead = site("https://a.com/", SiteRole::Competitor, 78, 12, 20);
        let behind = site("https://b.com/", SiteRole::Competitor, 52, 20, 10);

        let targets = gap_targets(&user, &[&ahead, &behind], GapScope::default());
        let gaps = find_gaps(&user, &targets, 0.2);

        let seo_gap = gaps
            .iter()
            .find(|g| g.competitor_url == "https://b.com/" && g.dimension == Dimension::Seo)
            .expect("b.com leads SEO by 10");
        assert_eq!(seo_gap.gap_magnitude, 10);
        assert_eq!(seo_gap.user_score, 10);
        assert_eq!(seo_gap.competitor_score, 20);
    }

    #[test]
    fn test_user_leading_everyone_has_no_targets() {
        let user = site("https://u.com/", SiteRole::User, 90, 10, 10);
        // b.com scores better on SEO but is behind on total
        let rival = site("https://b.com/", SiteRole::Competitor, 80, 30, 10);

        for scope in [GapScope::All, GapScope::Outranking] {
            let targets = gap_targets(&user, &[&rival], scope);
            assert!(targets.is_empty());
            assert!(find_gaps(&user, &targets, 0.2).is_empty());
        }
    }

    #[test]
    fn test_total_tie_keeps_targets() {
        let user = site("https://u.com/", SiteRole::User, 70, 10, 10);
        let rival = site("https://a.com/", SiteRole::Competitor, 70, 30, 10);

        let targets = gap_targets(&user, &[&rival], GapScope::All);
        assert_eq!(targets.len(), 1);
    }
}

//! Markdown report generation
//!
//! This module renders a finished comparison as a human-readable markdown
//! document: rankings, failures, the gaps behind them and the action plan.

use crate::model::{ComparisonResult, Dimension, StrategicAction};
use crate::output::{OutputError, OutputResult};
use crate::state::ComparisonJob;
use std::path::Path;

/// Writes the markdown report of a comparison to `output_path`
///
/// # Arguments
///
/// * `job` - The finished job
/// * `result` - Its comparison result
/// * `config_hash` - Hash of the configuration the job ran under, if known
/// * `output_path` - Path where the markdown file should be written
pub fn write_markdown_report(
    job: &ComparisonJob,
    result: &ComparisonResult,
    config_hash: Option<&str>,
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_markdown_report(job, result, config_hash);

    std::fs::write(output_path, markdown).map_err(|source| OutputError::Write {
        path: output_path.display().to_string(),
        source,
    })
}

/// Formats a comparison as markdown
pub fn format_markdown_report(
    job: &ComparisonJob,
    result: &ComparisonResult,
    config_hash: Option<&str>,
) -> String {
    let mut md = String::new();

    md.push_str("# Rivalscope Competitive Comparison\n\n");

    // Job metadata
    md.push_str("## Job Information\n\n");
    md.push_str(&format!("- **Job ID**: {}\n", job.id));
    md.push_str(&format!("- **Site**: {}\n", result.user_url));
    md.push_str(&format!(
        "- **Competitors**: {}\n",
        job.competitor_urls.join(", ")
    ));
    md.push_str(&format!("- **Page Budget**: {} per site\n", job.max_pages));
    md.push_str(&format!("- **Started**: {}\n", job.created_at.to_rfc3339()));
    if let Some(completed) = job.completed_at {
        md.push_str(&format!("- **Finished**: {}\n", completed.to_rfc3339()));
        let seconds = (completed - job.created_at).num_seconds();
        md.push_str(&format!("- **Duration**: {} seconds\n", seconds));
    }
    md.push_str(&format!("- **Status**: {}\n", job.status));
    if let Some(hash) = config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    // Summary
    let summary = &result.summary;
    md.push_str("## Summary\n\n");
    match (summary.user_rank, summary.user_score) {
        (Some(rank), Some(score)) => {
            md.push_str(&format!(
                "- **Your Rank**: {} of {}\n",
                rank, summary.sites_ranked
            ));
            md.push_str(&format!("- **Your Score**: {}\n", score));
        }
        _ => md.push_str("- **Your Rank**: not ranked (your site's audit failed)\n"),
    }
    if let Some(top) = summary.top_score {
        md.push_str(&format!("- **Top Score**: {}\n", top));
    }
    md.push_str(&format!(
        "- **Points Behind First**: {}\n",
        summary.score_gap_to_first
    ));
    if let Some(average) = summary.average_competitor_score {
        md.push_str(&format!(
            "- **Competitor Scores**: {} to {} (average {:.1})\n",
            summary.lowest_competitor_score.unwrap_or(0),
            summary.highest_competitor_score.unwrap_or(0),
            average
        ));
    }
    md.push_str(&format!(
        "- **Sites Ranked**: {} ({} failed)\n\n",
        summary.sites_ranked, summary.sites_failed
    ));

    // Rankings
    md.push_str("## Rankings\n\n");
    md.push_str("| Rank | Site | Score |\n");
    md.push_str("|------|------|-------|\n");
    for entry in &result.rankings {
        let rank = entry
            .rank
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());
        let score = entry
            .score
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        let marker = if entry.url == result.user_url {
            " (you)"
        } else {
            ""
        };
        md.push_str(&format!(
            "| {} | {}{} | {} |\n",
            rank, entry.url, marker, score
        ));
    }
    md.push('\n');

    // Failures
    if !result.failures.is_empty() {
        md.push_str("## Failed Audits\n\n");
        for failure in &result.failures {
            md.push_str(&format!("- {}: {}\n", failure.url, failure.reason));
        }
        md.push('\n');
    }

    // Dimension breakdown
    let scored: Vec<_> = result.sites.iter().filter(|s| s.is_success()).collect();
    if !scored.is_empty() {
        md.push_str("## Dimension Scores\n\n");
        md.push_str("| Dimension |");
        for site in &scored {
            md.push_str(&format!(" {} |", site.url));
        }
        md.push_str("\n|-----------|");
        for _ in &scored {
            md.push_str("------|");
        }
        md.push('\n');

        for dimension in Dimension::ALL {
            md.push_str(&format!("| {} |", dimension.label()));
            for site in &scored {
                match site.dimensions.get(&dimension) {
                    Some(score) => md.push_str(&format!(" {}/{} |", score.current, score.max)),
                    None => md.push_str(" - |"),
                }
            }
            md.push('\n');
        }
        md.push('\n');
    }

    // Gaps
    if !result.gaps.is_empty() {
        md.push_str(&format!(
            "## Top Gaps ({} of {})\n\n",
            result.gaps.len(),
            result.total_gaps
        ));
        md.push_str("| Dimension | Competitor | You | Them | Gap | Priority |\n");
        md.push_str("|-----------|------------|-----|------|-----|----------|\n");
        for gap in &result.gaps {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                gap.dimension.label(),
                gap.competitor_url,
                gap.user_score,
                gap.competitor_score,
                gap.gap_magnitude,
                gap.priority
            ));
        }
        md.push('\n');
    }

    // Strategy
    if !result.strategy.is_empty() {
        md.push_str("## Strategic Plan\n\n");
        for (index, action) in result.strategy.iter().enumerate() {
            md.push_str(&format_action(index + 1, action));
        }
        md.push('\n');
    }

    // Quick wins
    md.push_str("## Quick Wins\n\n");
    if result.quick_wins.actions.is_empty() {
        let reason = result
            .quick_wins
            .empty_reason
            .map(|r| r.to_string())
            .unwrap_or_else(|| "none found".to_string());
        md.push_str(&format!("No quick wins: {}.\n", reason));
    } else {
        for (index, action) in result.quick_wins.actions.iter().enumerate() {
            md.push_str(&format_action(index + 1, action));
        }
    }

    md
}

fn format_action(position: usize, action: &StrategicAction) -> String {
    let mut line = format!(
        "{}. **{}** ({} effort, +{} points): {}",
        position,
        action.dimension.label(),
        action.effort,
        action.estimated_impact,
        action.description
    );
    if action.potential_rank < action.current_rank {
        line.push_str(&format!(
            " Rank {} -> {}.",
            action.current_rank, action.potential_rank
        ));
    }
    line.push('\n');
    line
}

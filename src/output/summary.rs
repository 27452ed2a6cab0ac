//! Terminal summaries of comparisons and jobs

use crate::model::ComparisonResult;
use crate::state::JobStatusView;

/// Prints a comparison result in human-readable form
pub fn print_comparison(result: &ComparisonResult) {
    println!("=== Competitive Comparison: {} ===\n", result.user_url);

    println!("Rankings:");
    for entry in &result.rankings {
        match (entry.rank, entry.score) {
            (Some(rank), Some(score)) => {
                let marker = if entry.url == result.user_url {
                    "  <- you"
                } else {
                    ""
                };
                println!("  {}. {} ({}){}", rank, entry.url, score, marker);
            }
            _ => println!("  -  {} (not ranked)", entry.url),
        }
    }
    println!();

    if !result.failures.is_empty() {
        println!("Failed audits:");
        for failure in &result.failures {
            println!("  {}: {}", failure.url, failure.reason);
        }
        println!();
    }

    let summary = &result.summary;
    match summary.user_rank {
        Some(rank) => println!(
            "You rank {} of {}, {} points behind first.",
            rank, summary.sites_ranked, summary.score_gap_to_first
        ),
        None => println!("Your site could not be audited, so it was not ranked."),
    }
    println!(
        "Gaps: showing {} of {}",
        result.gaps.len(),
        result.total_gaps
    );
    println!();

    if !result.strategy.is_empty() {
        println!("Strategic plan:");
        for (index, action) in result.strategy.iter().enumerate() {
            println!(
                "  {}. [{} effort, priority {:.1}] {}",
                index + 1,
                action.effort,
                action.priority_score,
                action.description
            );
            if action.potential_rank < action.current_rank {
                println!(
                    "     rank {} -> {}",
                    action.current_rank, action.potential_rank
                );
            }
        }
        println!();
    }

    if result.quick_wins.actions.is_empty() {
        if let Some(reason) = result.quick_wins.empty_reason {
            println!("Quick wins: none ({})", reason);
        }
    } else {
        println!("Quick wins:");
        for action in &result.quick_wins.actions {
            println!("  - {}", action.description);
        }
    }
}

/// Prints one line describing a job's progress
pub fn print_status(view: &JobStatusView) {
    let mut line = format!(
        "Job {}: {} ({}%, {}/{} sites settled)",
        view.id, view.status, view.progress, view.sites_completed, view.sites_total
    );
    if let Some(error) = &view.error {
        line.push_str(&format!(" - {}", error));
    }
    println!("{}", line);
}

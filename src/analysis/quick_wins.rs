//! Quick-win selector

use crate::model::{Effort, QuickWinEmptyReason, QuickWinSelection, StrategicAction};

/// Picks low-effort actions that move the user up the ranking
///
/// Candidates keep the strategy's priority order and are truncated to
/// `limit`. When nothing qualifies, the selection says why.
pub fn select(actions: &[StrategicAction], limit: usize) -> QuickWinSelection {
    let low_effort: Vec<&StrategicAction> = actions
        .iter()
        .filter(|action| action.effort == Effort::Low)
        .collect();

    let mut picked: Vec<StrategicAction> = low_effort
        .iter()
        .filter(|action| action.potential_rank < action.current_rank)
        .map(|action| (*action).clone())
        .collect();
    picked.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score));
    picked.truncate(limit);

    let empty_reason = if !picked.is_empty() {
        None
    } else if actions.is_empty() {
        Some(QuickWinEmptyReason::NoActions)
    } else if low_effort.is_empty() {
        Some(QuickWinEmptyReason::NoLowEffort)
    } else {
        Some(QuickWinEmptyReason::NoRankImprovement)
    };

    QuickWinSelection {
        actions: picked,
        empty_reason,
    }
}

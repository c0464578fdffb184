//! Choice availability and presentation.
//!
//! An option is available iff it is affordable (non-positive time cost,
//! or a positive cost within the current budget) and not suppressed by
//! the once-only gate (once-flagged options disappear after their
//! target has been visited). Neither exclusion is an error — it is
//! normal filtering. Evaluation preserves authoring order.

use skein_core::PlayerState;

use crate::step::ChoiceDef;

/// Whether a single option passes both availability gates.
pub fn is_available(option: &ChoiceDef, player: &PlayerState) -> bool {
    let cost = option.time_cost();
    let affordable = cost <= 0.0 || player.has_time(cost);
    let replayable = !(option.once() && player.visited(option.target));
    affordable && replayable
}

/// Indices of available options, in authoring order.
pub fn available_indices(options: &[ChoiceDef], player: &PlayerState) -> Vec<usize> {
    options
        .iter()
        .enumerate()
        .filter(|(_, option)| is_available(option, player))
        .map(|(index, _)| index)
        .collect()
}

/// The options to present: available ones in authoring order, truncated
/// from the tail to the display maximum. Truncation is an authoring
/// error worth a warning, not a failure.
pub fn presentable(
    options: &[ChoiceDef],
    player: &PlayerState,
    max_choices: usize,
) -> Vec<ChoiceDef> {
    let mut presented: Vec<ChoiceDef> = options
        .iter()
        .filter(|option| is_available(option, player))
        .cloned()
        .collect();
    if presented.len() > max_choices {
        tracing::warn!(
            available = presented.len(),
            max_choices,
            "more available choices than the display can show, truncating"
        );
        presented.truncate(max_choices);
    }
    presented
}

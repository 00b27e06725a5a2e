use crate::model::{CandidatePair, Classification, MatchOutput};
use crate::resolver::collect_unknown_names;

/// Scores agree once the right observation is put in the left orientation.
/// A missing score only agrees with a missing score.
pub fn scores_agree(pair: &CandidatePair) -> bool {
    pair.left.points() == pair.right_points_oriented()
}

/// Split match output into report buckets.
pub fn classify(output: &MatchOutput) -> Classification {
    let (consistent, conflicting): (Vec<CandidatePair>, Vec<CandidatePair>) =
        output.pairs.iter().cloned().partition(scores_agree);

    let unknown_names =
        collect_unknown_names(output.unknown_left.iter().chain(&output.unknown_right));

    for name in &unknown_names {
        log::warn!(
            "unknown team '{}' from {} ({} games affected)",
            name.raw_name,
            name.source,
            name.observations.len()
        );
    }
    for group in &output.multiply_matched {
        log::warn!(
            "multiply-matched: {} left / {} right observations on {}",
            group.left.len(),
            group.right.len(),
            group.left.first().map_or_else(String::new, |o| o.observation.date.to_string()),
        );
    }

    Classification {
        consistent,
        conflicting,
        multiply_matched: output.multiply_matched.clone(),
        unmatched_left: output.unmatched_left.clone(),
        unmatched_right: output.unmatched_right.clone(),
        unknown_left: output.unknown_left.clone(),
        unknown_right: output.unknown_right.clone(),
        unknown_names,
    }
}

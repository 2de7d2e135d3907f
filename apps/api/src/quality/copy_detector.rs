/// Leading chars of the candidate that are searched for.
pub const CANDIDATE_WINDOW: usize = 50;
/// Leading chars of the original that are searched in.
pub const ORIGINAL_WINDOW: usize = 200;

/// Reports whether `candidate` looks like a truncated copy of `original`.
///
/// The first [`CANDIDATE_WINDOW`] chars of the case-folded candidate must occur
/// verbatim within the first [`ORIGINAL_WINDOW`] chars of the case-folded
/// original. This is a prefix-containment heuristic: paraphrased or reordered
/// copies are not detected, and the check is deliberately one-directional.
pub fn is_just_copy(original: &str, candidate: &str) -> bool {
    let original: String = original.to_lowercase().chars().take(ORIGINAL_WINDOW).collect();
    let candidate: String = candidate
        .to_lowercase()
        .chars()
        .take(CANDIDATE_WINDOW)
        .collect();
    original.contains(&candidate)
}

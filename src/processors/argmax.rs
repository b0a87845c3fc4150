//! Argmax over a classification score vector.

/// Returns the index of the maximum score, or `None` for an empty slice.
///
/// Ties break to the lowest index: a later score must be strictly greater to
/// replace the current best, so the first occurrence always wins.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &score) in scores.iter().enumerate() {
        match best {
            None => best = Some((idx, score)),
            Some((_, top)) if score > top => best = Some((idx, score)),
            _ => {}
        }
    }
    best.map(|(idx, _)| idx)
}

//! Vector similarity utilities.

use rolecast_core::story::StoryEntry;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is empty, zero, or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Rank entries by cosine similarity to a query embedding.
///
/// Returns up to `limit` `(index, score)` pairs, highest score first. Equal
/// scores keep insertion order, so ranking is deterministic. A NaN score
/// (from a non-finite embedding) ranks last as negative infinity.
pub fn rank_by_similarity(
    entries: &[StoryEntry],
    query_embedding: &[f32],
    limit: usize,
) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let score = cosine_similarity(&entry.embedding, query_embedding);
            (i, if score.is_nan() { f32::NEG_INFINITY } else { score })
        })
        .collect();

    // sort_by is stable: ties stay in index order.
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(limit);
    scored
}

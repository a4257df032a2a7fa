use std::collections::HashSet;

use crate::model::{Category, DatasetBuckets, Overlap, SimilarityEntry};

/// Decimal digits kept in Jaccard scores.
pub const JACCARD_DIGITS: i32 = 3;

/// Intersection, union and Jaccard score of two key sets.
///
/// The rounded score never reaches 1 unless the sets are equal, and never
/// reaches 0 unless they are disjoint.
pub fn overlap(a: &HashSet<String>, b: &HashSet<String>) -> Overlap {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    Overlap {
        intersection,
        union,
        jaccard: jaccard(intersection, union),
    }
}

pub fn jaccard(intersection: usize, union: usize) -> f64 {
    if union == 0 || intersection == 0 {
        return 0.0;
    }
    if intersection == union {
        return 1.0;
    }
    let scale = 10f64.powi(JACCARD_DIGITS);
    let step = 1.0 / scale;
    let rounded = (intersection as f64 / union as f64 * scale).round() / scale;
    rounded.clamp(step, 1.0 - step)
}

/// Pairwise similarity for every `i < j`, in input order.
pub fn build_matrix(buckets: &[DatasetBuckets]) -> Vec<SimilarityEntry> {
    let n = buckets.len();
    let mut entries = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            let (left, right) = (&buckets[i], &buckets[j]);
            let pair = |c: Category| overlap(left.keys(c), right.keys(c));
            entries.push(SimilarityEntry {
                left: i,
                right: j,
                left_label: left.label.clone(),
                right_label: right.label.clone(),
                failed: pair(Category::Failed),
                passed: pair(Category::Passed),
                minor: pair(Category::Minor),
            });
        }
    }
    log::debug!("similarity matrix: {} pairs", entries.len());
    entries
}

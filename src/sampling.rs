//! Initial centroid sampling.

use std::cmp::Ordering;

use rand::Rng;

fn lexicographic(lhs: &[f32], rhs: &[f32]) -> Ordering {
    lhs.iter()
        .zip(rhs.iter())
        .map(|(l, r)| l.partial_cmp(r).unwrap_or(Ordering::Equal))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Count the distinct-valued points.
///
/// Values must be finite, otherwise the count is meaningless.
pub fn distinct_count<P: AsRef<[f32]>>(points: &[P]) -> usize {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_unstable_by(|&a, &b| lexicographic(points[a].as_ref(), points[b].as_ref()));
    order.dedup_by(|a, b| points[*a].as_ref() == points[*b].as_ref());
    order.len()
}

/// Sample `n_cluster` pairwise distinct points uniformly at random as the initial centroids.
///
/// Each slot is re-drawn until it differs from every centroid chosen before it.
/// The caller must guarantee `n_cluster <= distinct_count(points)`, otherwise this never
/// returns. Returns the centroids flattened as `n_cluster * dim` values.
pub fn sample_distinct<P, R>(points: &[P], n_cluster: usize, rng: &mut R) -> Vec<f32>
where
    P: AsRef<[f32]>,
    R: Rng + ?Sized,
{
    let Some(first) = points.first() else {
        return Vec::new();
    };
    let dim = first.as_ref().len();
    let mut centroids: Vec<f32> = Vec::with_capacity(n_cluster * dim);
    for _ in 0..n_cluster {
        loop {
            let candidate = points[rng.random_range(0..points.len())].as_ref();
            if centroids.chunks(dim).all(|c| c != candidate) {
                centroids.extend_from_slice(candidate);
                break;
            }
        }
    }
    centroids
}

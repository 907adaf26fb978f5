//! Compute the distance between vectors.

/// Compute the squared Euclidean distance between two vectors.
///
/// The square root is skipped since only the ordering matters for assignment.
#[inline]
pub fn squared_euclidean(lhs: &[f32], rhs: &[f32]) -> f32 {
    lhs.iter()
        .zip(rhs.iter())
        .map(|(&l, &r)| (l - r) * (l - r))
        .sum()
}

/// Index of the first minimum value.
///
/// Ties resolve to the lowest index. Returns 0 for an empty slice.
#[inline]
pub fn argmin(values: &[f32]) -> usize {
    let mut index = 0;
    let mut min = f32::MAX;
    for (i, &v) in values.iter().enumerate() {
        if i == 0 || v < min {
            min = v;
            index = i;
        }
    }
    index
}

/// Relative change of one centroid axis between two iterations.
///
/// A zero previous value has no scale: staying at zero counts as no change,
/// moving away from zero counts as an unbounded change.
#[inline]
pub fn relative_shift(old: f32, new: f32) -> f32 {
    if old == 0.0 {
        if new == 0.0 { 0.0 } else { f32::INFINITY }
    } else {
        ((new - old) / old).abs()
    }
}

#[cfg(test)]
mod test {
    use super::{argmin, relative_shift, squared_euclidean};

    #[test]
    fn test_squared_euclidean() {
        assert_eq!(squared_euclidean(&[0.0, 0.0, 0.0], &[1.0, 2.0, 2.0]), 9.0);
        assert_eq!(squared_euclidean(&[3.5, -1.0], &[3.5, -1.0]), 0.0);
        assert_eq!(squared_euclidean(&[10.0], &[7.0]), 9.0);
    }

    #[test]
    fn test_argmin_first_minimum_wins() {
        assert_eq!(argmin(&[3.0, 1.0, 2.0]), 1);
        assert_eq!(argmin(&[2.0, 1.0, 1.0, 5.0]), 1);
        assert_eq!(argmin(&[4.0, 4.0, 4.0]), 0);
        assert_eq!(argmin(&[f32::MAX, f32::MAX]), 0);
        assert_eq!(argmin(&[]), 0);
    }

    #[test]
    fn test_relative_shift() {
        assert_eq!(relative_shift(100.0, 101.0), 0.01);
        assert_eq!(relative_shift(-50.0, -25.0), 0.5);
        assert_eq!(relative_shift(0.0, 0.0), 0.0);
        assert_eq!(relative_shift(0.0, 0.001), f32::INFINITY);
        assert_eq!(relative_shift(0.0, -3.0), f32::INFINITY);
        assert_eq!(relative_shift(2.0, 0.0), 1.0);
    }
}

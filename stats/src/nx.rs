use num_traits::{AsPrimitive, PrimInt};
use std::fmt::Display;

/// Compute the NX of a distribution given as `(value, multiplicity)` pairs.
///
/// The result is the largest value `v` such that the values `>= v`, each
/// weighted by itself, add up to at least `fraction` of the weighted total.
/// Pairs with zero multiplicity carry no weight and are ignored.
///
/// # Outputs
/// - `Option<T>`: `None` only when the distribution is empty.
///
/// # Panics
/// - If `fraction` is not within (0, 1).
/// - If any value is negative. The statistic is only meaningful for
///   non-negative lengths or counts, so this points to a bug in the caller.
///
/// # Example
/// ```rust
/// use stats::nx_of_counts;
/// // [10, 10, 10, 10, 1]
/// assert_eq!(nx_of_counts([(1u64, 1), (10, 4)], 0.5), Some(10));
/// assert_eq!(nx_of_counts(Vec::<(u64, u64)>::new(), 0.5), None);
/// ```
pub fn nx_of_counts<T, I>(counts: I, fraction: f64) -> Option<T>
where
    T: PrimInt + AsPrimitive<f64> + Display,
    I: IntoIterator<Item = (T, u64)>,
{
    assert!(fraction > 0f64 && fraction < 1f64);

    let mut rev_sorted: Vec<(T, u64)> = counts
        .into_iter()
        .inspect(|(value, _)| {
            assert!(
                *value >= T::zero(),
                "Found a negative number while computing Nx : {value}"
            );
        })
        .filter(|&(_, n)| n > 0)
        .collect();
    rev_sorted.sort_unstable_by(|x, y| x.0.cmp(&y.0).reverse());

    let weight = |(value, n): (T, u64)| value.as_() * n as f64;
    let cutoff_sum = rev_sorted.iter().copied().map(weight).sum::<f64>() * fraction;

    let mut cumulative_sum = 0f64;
    for entry in rev_sorted {
        cumulative_sum += weight(entry);
        if cumulative_sum >= cutoff_sum {
            return Some(entry.0);
        }
    }
    None
}

/// Compute the N50 of a distribution given as `(value, multiplicity)` pairs.
/// See [`nx_of_counts`].
pub fn n50_of_counts<T, I>(counts: I) -> Option<T>
where
    T: PrimInt + AsPrimitive<f64> + Display,
    I: IntoIterator<Item = (T, u64)>,
{
    nx_of_counts(counts, 0.5f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_n50_of_counts() {
        // [100, 70, 60, 50, 50, 40, 30]
        let counts = [(100, 1), (70, 1), (60, 1), (50, 2), (40, 1), (30, 1)];
        assert_eq!(n50_of_counts(counts), Some(60));
        // Mostly shallow UMIs, with the reads held by a few deep ones.
        let counts = [(2u64, 10), (1, 20), (30, 1), (8, 3)];
        assert_eq!(n50_of_counts(counts), Some(8));
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let counts = vec![(1u32, 1), (10, 4)];
        let reversed: Vec<_> = counts.iter().rev().copied().collect();
        assert_eq!(n50_of_counts(counts), Some(10));
        assert_eq!(n50_of_counts(reversed), Some(10));
    }

    #[test]
    fn test_n50_empty() {
        assert_eq!(n50_of_counts(Vec::<(u64, u64)>::new()), None);
        assert_eq!(n50_of_counts([(5u64, 0)]), None);
    }

    #[test]
    fn test_n50_half_is_inclusive() {
        // 20 of 40 is exactly half
        assert_eq!(n50_of_counts([(10u32, 2), (5, 4)]), Some(10));
    }

    #[test]
    fn test_n50_zero_values() {
        assert_eq!(n50_of_counts([(0u32, 4), (7, 1)]), Some(7));
        assert_eq!(n50_of_counts([(0u32, 2)]), Some(0));
    }

    #[test]
    fn test_zero_multiplicity_is_ignored() {
        assert_eq!(n50_of_counts([(10u64, 0), (1, 3)]), Some(1));
    }

    #[test]
    #[should_panic]
    fn test_n50_panic_negative() {
        let _ = n50_of_counts([(68i32, 1), (-2, 1)]);
    }

    #[test]
    fn test_n90() {
        let counts = [(100i64, 1), (70, 1), (60, 1), (50, 2), (40, 1), (30, 1)];
        assert_eq!(nx_of_counts(counts, 0.9), Some(40));
    }
}

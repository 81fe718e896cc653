//! # Interval Consensus
//!
//! Merges independently observed `[min, max]` sequence ranges into one
//! agreed range tolerant of up to `f` faulty or missing observations.

use crate::domain::entities::Interval;
use crate::domain::errors::{CommitError, CommitResult};

/// Compress a set of observed intervals into one agreed interval.
///
/// The consensus runtime only invokes the report phase with `2f + 1`
/// observations, of which up to `f` may be unparseable or adversarial; the
/// caller passes the parseable ones here.
///
/// Selecting `sorted_mins[f]` guarantees at least one honest observer is at
/// or above the chosen min, so an adversary controlling `f` values cannot
/// bias it downward (which would re-commit already-committed sequence
/// numbers and revert on-chain). Selecting `sorted_maxes[f]` is the mirror
/// argument: at least one honest observer has seen up to the chosen max, so
/// an adversary cannot push the range past what honest nodes can rebuild.
///
/// `range_limit` caps the span of the result (zero means no limit): the
/// batch must fit in one Merkle tree.
pub fn interval_consensus(
    mut intervals: Vec<Interval>,
    f: usize,
    range_limit: u64,
) -> CommitResult<Interval> {
    if intervals.len() <= f {
        return Err(CommitError::NotEnoughObservations {
            got: intervals.len(),
            f,
        });
    }

    intervals.sort_unstable_by_key(|interval| interval.min);
    let min = intervals[f].min;

    // A min of zero means there are no messages to report; the report may
    // still be valid for price updates.
    if min == 0 {
        return Ok(Interval::new(0, 0));
    }

    intervals.sort_unstable_by_key(|interval| interval.max);
    let mut max = intervals[f].max;
    if max < min {
        // Invalid for on-chain acceptance; abstain this round.
        return Err(CommitError::MaxSmallerThanMin);
    }

    if range_limit > 0 && max - min + 1 > range_limit {
        max = min + range_limit - 1;
    }

    Ok(Interval::new(min, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intervals(pairs: &[(u64, u64)]) -> Vec<Interval> {
        pairs.iter().map(|&(min, max)| Interval::new(min, max)).collect()
    }

    #[test]
    fn test_agreement_across_overlapping_views() {
        let agreed =
            interval_consensus(intervals(&[(9, 14), (10, 12), (10, 14)]), 1, 0).unwrap();
        assert_eq!(agreed, Interval::new(10, 14));
    }

    #[test]
    fn test_range_limit_truncates() {
        let agreed = interval_consensus(intervals(&[(10, 100), (1, 1000)]), 1, 256).unwrap();
        assert_eq!(agreed, Interval::new(10, 265));
    }

    #[test]
    fn test_zero_min_short_circuits() {
        // f=1 with one node seeing nothing: min lands on 0, valid
        // price-only round.
        let agreed = interval_consensus(intervals(&[(0, 0), (0, 0), (5, 10)]), 1, 0).unwrap();
        assert_eq!(agreed, Interval::new(0, 0));
    }

    #[test]
    fn test_adversary_cannot_lower_min() {
        // One faulty node reports an absurdly low min; sorted_mins[f] skips it.
        let agreed =
            interval_consensus(intervals(&[(1, 20), (10, 20), (10, 20)]), 1, 0).unwrap();
        assert_eq!(agreed.min, 10);
    }

    #[test]
    fn test_adversary_cannot_raise_max() {
        // One faulty node reports a max beyond every honest view.
        let agreed = interval_consensus(
            intervals(&[(10, 12), (10, 12), (10, 1_000_000)]),
            1,
            0,
        )
        .unwrap();
        assert_eq!(agreed.max, 12);
    }

    #[test]
    fn test_max_smaller_than_min_fails() {
        // Disjoint views can produce an inverted interval; abstain.
        let err = interval_consensus(intervals(&[(10, 11), (20, 30)]), 1, 0).unwrap_err();
        assert!(matches!(err, CommitError::MaxSmallerThanMin));
    }

    #[test]
    fn test_never_inverted_on_success() {
        let cases: &[&[(u64, u64)]] = &[
            &[(1, 1), (1, 1), (1, 1)],
            &[(3, 9), (4, 8), (5, 7)],
            &[(0, 0), (2, 4), (2, 6)],
        ];
        for pairs in cases {
            if let Ok(agreed) = interval_consensus(intervals(pairs), 1, 256) {
                assert!(agreed.min <= agreed.max, "inverted interval for {pairs:?}");
            }
        }
    }
}

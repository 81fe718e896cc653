//! # Sequence & Set Helpers
//!
//! Contiguity checking for scanned send requests and deterministic set
//! flattening for token queries.

use tracing::warn;

/// True iff `seq_nums` is exactly the contiguous range `[min..=max]`.
///
/// A gap means either a faulty reader or a genuine hole in the chain's log
/// history; both must fail the round rather than be silently skipped.
pub fn contiguous_seq_nums(min: u64, max: u64, seq_nums: &[u64]) -> bool {
    if max < min || seq_nums.len() as u64 != max - min + 1 {
        warn!(
            min,
            max,
            got = seq_nums.len(),
            "sequence number count does not match interval"
        );
        return false;
    }
    for (offset, &seq) in seq_nums.iter().enumerate() {
        let want = min + offset as u64;
        if seq != want {
            warn!(want, got = seq, "gap in sequence numbers");
            return false;
        }
    }
    true
}

/// Flatten several ordered slices into one sorted, deduplicated vector.
/// Used to build deterministic token query sets.
pub fn flatten_unique_sorted<T: Ord + Copy>(slices: &[&[T]]) -> Vec<T> {
    let mut out: Vec<T> = slices.iter().flat_map(|s| s.iter().copied()).collect();
    out.sort_unstable();
    out.dedup();
    out
}

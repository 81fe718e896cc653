//! # Price Consensus
//!
//! Pure price math: median-of-observations, relative deviation in parts per
//! billion, and the USD-per-smallest-denomination conversion.

use lane_types::U256;

/// Upper-middle median of a non-empty slice: for an even count the higher
/// of the two middle values is taken, so a single adversarial low-ball
/// cannot drag the result below every honest observation.
///
/// Returns `None` on an empty slice.
pub fn sorted_middle(values: &[U256]) -> Option<U256> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    Some(sorted[sorted.len() / 2])
}

/// True when `a` and `b` differ by more than `ppb` parts per billion,
/// relative to the smaller of the two magnitudes.
///
/// Symmetric in its arguments. Equal values never deviate; a zero against a
/// non-zero is treated as maximal deviation (always publish).
pub fn deviates(a: U256, b: U256, ppb: u64) -> bool {
    if a == b {
        return false;
    }
    if a.is_zero() || b.is_zero() {
        // A price appearing or collapsing to zero is always worth publishing.
        return true;
    }
    let (smaller, larger) = if a < b { (a, b) } else { (b, a) };
    let diff = larger - smaller;
    // diff / smaller > ppb / 1e9, rearranged to avoid truncation bias.
    diff * U256::from(1_000_000_000u64) > smaller * U256::from(ppb)
}

/// Convert a USD price per full token (1e18 scale) into a USD price per
/// 1e18 units of the token's smallest denomination.
///
/// Example: 1 USDC at $1.00 with 6 decimals: `1e18 * 1e18 / 1e6 = 1e30`.
pub fn usd_per_1e18_token_amount(price: U256, decimals: u8) -> U256 {
    price * U256::exp10(18) / U256::exp10(decimals as usize)
}

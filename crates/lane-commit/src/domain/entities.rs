//! # Domain Entities
//!
//! Reports, observations, and chain-log rows exchanged between the commit
//! plugin and its collaborators.

use std::collections::BTreeMap;
use std::time::SystemTime;

use lane_types::{Address, ChainSelector, Hash, U256, ZERO_HASH};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

/// A contiguous range of message sequence numbers, inclusive on both ends.
///
/// `{0, 0}` is the valid "no messages" interval: a report carrying it may
/// still publish price updates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    /// First sequence number in the range.
    pub min: u64,
    /// Last sequence number in the range.
    pub max: u64,
}

impl Interval {
    /// Create an interval.
    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// True for the `{0, 0}` "no messages" interval.
    pub fn is_zero(&self) -> bool {
        self.min == 0 && self.max == 0
    }
}

/// A gas price update for one destination chain, USD-denominated at 1e18
/// scale per unit of gas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasPrice {
    /// Chain the gas price applies to.
    pub dest_chain_selector: ChainSelector,
    /// USD price at 1e18 scale.
    pub value: U256,
}

/// A token price update, USD-denominated at 1e18 scale per 1e18 units of the
/// token's smallest denomination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPrice {
    /// Token the price applies to.
    pub token: Address,
    /// USD price at 1e18 scale.
    pub value: U256,
}

/// The batched attestation a commit round produces: a contiguous message
/// range committed via Merkle root, and/or price updates.
///
/// Produced once per successful report phase, encoded, and handed to the
/// transport layer; never mutated afterward.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReport {
    /// Committed sequence number range. `{0, 0}` for price-only reports.
    pub interval: Interval,
    /// Merkle root over the hashes of the messages in `interval`.
    /// All-zero iff the report carries no message batch.
    pub merkle_root: Hash,
    /// Gas price updates (at most one per report).
    pub gas_prices: Vec<GasPrice>,
    /// Token price updates, ascending by token address.
    pub token_prices: Vec<TokenPrice>,
}

impl CommitReport {
    /// True when the report commits nothing: no batch and no price updates.
    pub fn is_empty(&self) -> bool {
        self.merkle_root == ZERO_HASH && self.gas_prices.is_empty() && self.token_prices.is_empty()
    }
}

/// One node's locally computed candidate for the round.
///
/// Price maps never contain a null value when produced honestly; a present
/// null entry marks the whole observation as faulty and it will be dropped
/// during report-phase validation. Absence of an entry is distinct from a
/// present-but-null value.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitObservation {
    /// Sequence range this node believes is ready to commit.
    pub interval: Interval,
    /// Observed source-chain gas price in USD at 1e18 scale, per destination
    /// chain selector of the lane. `None` marks a faulty observation unless
    /// price reporting is disabled.
    pub source_gas_price_usd: Option<U256>,
    /// Observed USD token prices for the destination token set.
    #[serde_as(as = "Vec<(_, _)>")]
    pub token_prices_usd: BTreeMap<Address, Option<U256>>,
}

/// A finalized cross-chain send request read from the source chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    /// Monotonically increasing per-lane message ordinal.
    pub sequence_number: u64,
    /// Hash of the message, used as a Merkle leaf.
    pub hash: Hash,
}

/// A confirmed token price row from the destination price registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenPriceLog {
    /// Token the price applies to.
    pub token: Address,
    /// USD price at 1e18 scale.
    pub value: U256,
    /// Chain timestamp of the update.
    pub timestamp: SystemTime,
}

/// A confirmed gas price row from the destination price registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasPriceLog {
    /// USD price at 1e18 scale.
    pub value: U256,
    /// Chain timestamp of the update.
    pub timestamp: SystemTime,
}

/// Latest-known price snapshot for a single key, merged from chain-confirmed
/// logs and the inflight cache. "Latest" always means the more recent of the
/// two by timestamp (inflight wins ties by construction).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriceUpdate {
    /// When the value was observed or accepted.
    pub timestamp: SystemTime,
    /// USD price at 1e18 scale.
    pub value: U256,
}

/// Token sets supported by the destination off-ramp.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OffRampTokens {
    /// Tokens deliverable on the destination chain.
    pub destination_tokens: Vec<Address>,
    /// Corresponding source-chain tokens.
    pub source_tokens: Vec<Address>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_is_zero() {
        assert!(Interval::new(0, 0).is_zero());
        assert!(!Interval::new(0, 1).is_zero());
        assert!(!Interval::new(1, 1).is_zero());
    }

    #[test]
    fn test_report_is_empty() {
        assert!(CommitReport::default().is_empty());

        let with_root = CommitReport {
            merkle_root: [1u8; 32],
            ..Default::default()
        };
        assert!(!with_root.is_empty());

        let with_gas = CommitReport {
            gas_prices: vec![GasPrice {
                dest_chain_selector: 1,
                value: U256::from(1),
            }],
            ..Default::default()
        };
        assert!(!with_gas.is_empty());
    }

    #[test]
    fn test_observation_json_round_trip() {
        let mut token_prices = BTreeMap::new();
        token_prices.insert([0xaa; 20], Some(U256::from(42u64)));
        token_prices.insert([0xbb; 20], None);

        let obs = CommitObservation {
            interval: Interval::new(3, 7),
            source_gas_price_usd: Some(U256::from(1_000_000u64)),
            token_prices_usd: token_prices,
        };

        let bytes = serde_json::to_vec(&obs).unwrap();
        let decoded: CommitObservation = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(obs, decoded);
    }

    #[test]
    fn test_observation_with_null_gas_price_parses() {
        // A faulty peer may serialize a null gas price; parsing must succeed
        // so the report phase can drop the observation instead of erroring.
        let obs = CommitObservation {
            interval: Interval::new(1, 2),
            source_gas_price_usd: None,
            token_prices_usd: BTreeMap::new(),
        };
        let bytes = serde_json::to_vec(&obs).unwrap();
        let decoded: CommitObservation = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded.source_gas_price_usd, None);
    }
}

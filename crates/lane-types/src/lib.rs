//! # LaneLink Shared Types
//!
//! Primitive types shared across the LaneLink commit core:
//! hashes, addresses, chain selectors, and consensus round identifiers.
//!
//! All USD-denominated prices in the system are `U256` values at 1e18 scale
//! ($1 = 1e18).

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};

pub use primitive_types::U256;

/// 32-byte hash (Keccak-256 output, Merkle roots, message hashes).
pub type Hash = [u8; 32];

/// 20-byte account/contract address.
pub type Address = [u8; 20];

/// Globally unique identifier of a chain within the protocol.
pub type ChainSelector = u64;

/// The all-zero hash. A commit report with this Merkle root carries no
/// message batch, only price updates.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Identifier of a single consensus round, assigned by the consensus runtime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportTimestamp {
    /// Consensus epoch.
    pub epoch: u32,
    /// Round within the epoch (0..=255).
    pub round: u8,
}

impl ReportTimestamp {
    /// Create a round identifier.
    pub fn new(epoch: u32, round: u8) -> Self {
        Self { epoch, round }
    }

    /// Merge epoch and round into a single totally-ordered value
    /// (`epoch << 8 | round`). Used to order price updates across rounds.
    pub fn merged(&self) -> u64 {
        (self.epoch as u64) << 8 | self.round as u64
    }
}

/// Format a byte slice as a 0x-prefixed hex string for logging.
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

//! # Domain Errors
//!
//! Error types for the commit reporting core.

use lane_types::Address;
use thiserror::Error;

use super::codec::CodecError;
use crate::algorithms::merkle::MerkleError;

/// Result alias used across the commit core.
pub type CommitResult<T> = Result<T, CommitError>;

/// Commit reporting error types.
///
/// Transient collaborator failures cause the round to be skipped for this
/// node; consensus tolerates up to `f` missing observations.
#[derive(Debug, Error)]
pub enum CommitError {
    /// The commit store contract is down or paused.
    #[error("commit store is down")]
    CommitStoreDown,

    /// The source chain is cursed; the lane must halt.
    #[error("source chain is cursed")]
    SourceCursed,

    /// The scanned send requests are not contiguous.
    #[error("unexpected gap in sequence numbers [{min}-{max}]")]
    SequenceGap {
        /// First sequence number of the scanned range.
        min: u64,
        /// Last sequence number of the scanned range.
        max: u64,
    },

    /// Re-fetching the agreed interval returned an incomplete range.
    #[error("do not have full range [{min}-{max}], got {got} messages")]
    IncompleteRange {
        /// Agreed interval min.
        min: u64,
        /// Agreed interval max.
        max: u64,
        /// Number of messages actually returned.
        got: usize,
    },

    /// The agreed interval is non-zero but no send requests exist for it.
    #[error("tried building a tree without leaves")]
    TreeWithoutLeaves,

    /// Fewer than `f + 1` observations survived validation.
    #[error("not enough valid observations to form consensus: got {got}, f={f}")]
    NotEnoughObservations {
        /// Valid observations remaining.
        got: usize,
        /// Maximum tolerated faulty participants.
        f: usize,
    },

    /// Interval consensus produced `max < min`; better to abstain this round.
    #[error("max seq num smaller than min")]
    MaxSmallerThanMin,

    /// The price oracle failed to resolve a requested token.
    #[error("missing token price: {}", lane_types::to_hex(.0))]
    MissingTokenPrice(Address),

    /// The gas price estimator returned no price.
    #[error("missing gas price")]
    MissingGasPrice,

    /// A report with this Merkle root is already awaiting confirmation.
    #[error("report is already in flight")]
    ReportAlreadyInflight,

    /// Merkle tree construction or verification failed.
    #[error(transparent)]
    Merkle(#[from] MerkleError),

    /// Report encoding or decoding failed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Observation serialization failed.
    #[error("observation serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A collaborator chain read failed (RPC error, cancellation).
    #[error("chain read failed: {0}")]
    ChainRead(String),
}

//! # Algorithms Module
//!
//! Pure consensus math: Merkle multi-proofs, interval consensus, price
//! medians and deviation, sequence contiguity.

pub mod calc;
pub mod interval;
pub mod merkle;
pub mod prices;

pub use calc::{contiguous_seq_nums, flatten_unique_sorted};
pub use interval::interval_consensus;
pub use merkle::{
    verify_compute_root, HasherCtx, Keccak256Ctx, MerkleError, Proof, Tree, MAX_NUM_TREE_LEAVES,
};
pub use prices::{deviates, sorted_middle, usd_per_1e18_token_amount};

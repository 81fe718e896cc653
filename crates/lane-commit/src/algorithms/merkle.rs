//! # Merkle Multi-Proof Tree
//!
//! Binary hash tree over a batch of message hashes, with compact proofs
//! covering any subset of leaves. The commit plugin uses the root to commit
//! to a batch without mirroring every message hash on-chain; the destination
//! contract later verifies executed messages against the root with a
//! multi-proof.
//!
//! Leaf and internal hashing are domain-separated so a concatenation of two
//! leaves can never collide with their parent node (second-preimage
//! resistance across tree levels). Internal hashing orders its operands,
//! which keeps multi-proof reconstruction free of left/right bookkeeping.

use lane_types::Hash;
use sha3::{Digest, Keccak256};
use thiserror::Error;

/// Hard cap on leaves in a single commit batch.
pub const MAX_NUM_TREE_LEAVES: usize = 256;

/// In a proof's source flags: this reconstruction step takes its second
/// operand from the known/computed set rather than the proof hashes.
pub const SOURCE_FROM_LEAVES: bool = true;

const LEAF_DOMAIN_SEPARATOR: u8 = 0x00;
const INTERNAL_DOMAIN_SEPARATOR: u8 = 0x01;

/// Merkle tree error types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MerkleError {
    /// Tree construction requires at least one leaf.
    #[error("cannot construct a tree without leaves")]
    NoLeaves,

    /// Tree construction exceeds the batch cap.
    #[error("too many leaves: {0}, max {MAX_NUM_TREE_LEAVES}")]
    TooManyLeaves(usize),

    /// A prove index does not address a leaf.
    #[error("leaf index {index} out of range for {leaves} leaves")]
    IndexOutOfRange {
        /// Offending index.
        index: usize,
        /// Number of leaves in the tree.
        leaves: usize,
    },

    /// Verification got neither leaves nor proof hashes.
    #[error("leaves and proofs are empty")]
    LeavesAndProofsEmpty,

    /// Verification input exceeds the batch cap.
    #[error("too many hashes: leaves and proofs total {0}, max {MAX_NUM_TREE_LEAVES}")]
    TooManyHashes(usize),

    /// The flag array length does not match the hash counts.
    #[error("invalid source flag count: got {got}, want {want}")]
    FlagCountMismatch {
        /// Flags supplied.
        got: usize,
        /// `leaves + proofs - 1`.
        want: usize,
    },

    /// The proof ran out of hashes mid-reconstruction.
    #[error("proof hashes exhausted during root reconstruction")]
    ProofExhausted,
}

/// Hashing context for tree construction and proof verification.
///
/// `hash_leaf` and `hash_internal` must be mutually non-colliding; the
/// zero hash pads partial batches to a full power of two.
pub trait HasherCtx {
    /// Hash raw leaf content.
    fn hash_leaf(&self, data: &[u8]) -> Hash;
    /// Hash two child nodes into their parent.
    fn hash_internal(&self, a: &Hash, b: &Hash) -> Hash;
    /// Canonical padding hash.
    fn zero_hash(&self) -> Hash;
}

/// Keccak-256 hashing context, domain-separated per tree level kind.
#[derive(Clone, Copy, Debug, Default)]
pub struct Keccak256Ctx;

impl HasherCtx for Keccak256Ctx {
    fn hash_leaf(&self, data: &[u8]) -> Hash {
        let mut hasher = Keccak256::new();
        hasher.update([LEAF_DOMAIN_SEPARATOR]);
        hasher.update(data);
        hasher.finalize().into()
    }

    fn hash_internal(&self, a: &Hash, b: &Hash) -> Hash {
        // Commutative pair hash: order the operands so verification does not
        // need to track which side each hash came from.
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let mut hasher = Keccak256::new();
        hasher.update([INTERNAL_DOMAIN_SEPARATOR]);
        hasher.update(lo);
        hasher.update(hi);
        hasher.finalize().into()
    }

    fn zero_hash(&self) -> Hash {
        [0u8; 32]
    }
}

/// Compact proof for a subset of leaves: sibling hashes plus, per
/// reconstruction step, whether the second operand comes from the
/// known/computed set ([`SOURCE_FROM_LEAVES`]) or the proof hashes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Proof {
    /// Sibling hashes, in consumption order.
    pub hashes: Vec<Hash>,
    /// One flag per reconstruction step; length is
    /// `leaves + hashes - 1`.
    pub source_flags: Vec<bool>,
}

/// Binary Merkle tree with all levels retained for proof construction.
#[derive(Debug)]
pub struct Tree {
    /// `levels[0]` is the padded leaf row; the last level holds the root.
    levels: Vec<Vec<Hash>>,
    /// Leaf count before padding.
    leaf_count: usize,
}

impl Tree {
    /// Build a tree over already-hashed leaves, padding on the right with
    /// the zero hash up to the next power of two.
    pub fn new<C: HasherCtx>(ctx: C, leaves: Vec<Hash>) -> Result<Self, MerkleError> {
        if leaves.is_empty() {
            return Err(MerkleError::NoLeaves);
        }
        if leaves.len() > MAX_NUM_TREE_LEAVES {
            return Err(MerkleError::TooManyLeaves(leaves.len()));
        }

        let leaf_count = leaves.len();
        let mut current = leaves;
        current.resize(leaf_count.next_power_of_two(), ctx.zero_hash());

        let mut levels = Vec::new();
        while current.len() > 1 {
            let mut next = Vec::with_capacity(current.len() / 2);
            for pair in current.chunks(2) {
                next.push(ctx.hash_internal(&pair[0], &pair[1]));
            }
            levels.push(current);
            current = next;
        }
        levels.push(current);

        Ok(Self { levels, leaf_count })
    }

    /// Number of leaves the tree was built over, excluding padding.
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Root hash of the tree.
    pub fn root(&self) -> Hash {
        self.levels[self.levels.len() - 1][0]
    }

    /// Build a multi-proof for the leaves at `indices` (into the unpadded
    /// leaf row). Duplicates are collapsed; order does not matter.
    pub fn prove(&self, indices: &[usize]) -> Result<Proof, MerkleError> {
        let mut known: Vec<usize> = indices.to_vec();
        known.sort_unstable();
        known.dedup();
        if let Some(&index) = known.iter().find(|&&i| i >= self.leaf_count) {
            return Err(MerkleError::IndexOutOfRange {
                index,
                leaves: self.leaf_count,
            });
        }
        if known.is_empty() {
            return Err(MerkleError::LeavesAndProofsEmpty);
        }

        let mut proof = Proof::default();
        for level in &self.levels[..self.levels.len() - 1] {
            let mut next_known = Vec::with_capacity(known.len());
            let mut i = 0;
            while i < known.len() {
                let index = known[i];
                let sibling = index ^ 1;
                if i + 1 < known.len() && known[i + 1] == sibling {
                    // Both children known: the verifier combines two entries
                    // from its own queue.
                    proof.source_flags.push(SOURCE_FROM_LEAVES);
                    i += 2;
                } else {
                    proof.hashes.push(level[sibling]);
                    proof.source_flags.push(!SOURCE_FROM_LEAVES);
                    i += 1;
                }
                next_known.push(index / 2);
            }
            known = next_known;
        }

        Ok(proof)
    }
}

/// Reconstruct the root from a subset of leaves and a multi-proof, without
/// knowledge of any other leaf. Leaves must be supplied in ascending
/// leaf-index order, matching how the proof was built.
///
/// Rejects (never panics) on: empty input, more than
/// [`MAX_NUM_TREE_LEAVES`] total hashes, or a flag count that does not
/// equal `leaves + proofs - 1`.
pub fn verify_compute_root<C: HasherCtx>(
    ctx: &C,
    leaves: &[Hash],
    proof: &Proof,
) -> Result<Hash, MerkleError> {
    let total_hashes = leaves.len() + proof.hashes.len();
    if total_hashes == 0 {
        return Err(MerkleError::LeavesAndProofsEmpty);
    }
    if total_hashes > MAX_NUM_TREE_LEAVES {
        return Err(MerkleError::TooManyHashes(total_hashes));
    }
    let want_flags = total_hashes - 1;
    if proof.source_flags.len() != want_flags {
        return Err(MerkleError::FlagCountMismatch {
            got: proof.source_flags.len(),
            want: want_flags,
        });
    }

    if want_flags == 0 {
        // A single hash is its own root.
        return Ok(if leaves.is_empty() {
            proof.hashes[0]
        } else {
            leaves[0]
        });
    }

    let mut computed: Vec<Hash> = Vec::with_capacity(want_flags);
    let (mut leaf_pos, mut computed_pos, mut proof_pos) = (0usize, 0usize, 0usize);

    for step in 0..want_flags {
        let a = take_known(leaves, &computed, &mut leaf_pos, &mut computed_pos)
            .ok_or(MerkleError::ProofExhausted)?;
        let b = if proof.source_flags[step] == SOURCE_FROM_LEAVES {
            take_known(leaves, &computed, &mut leaf_pos, &mut computed_pos)
                .ok_or(MerkleError::ProofExhausted)?
        } else {
            let hash = proof
                .hashes
                .get(proof_pos)
                .copied()
                .ok_or(MerkleError::ProofExhausted)?;
            proof_pos += 1;
            hash
        };
        computed.push(ctx.hash_internal(&a, &b));
    }

    Ok(computed[want_flags - 1])
}

/// Pop the next hash from the known set: supplied leaves first, then
/// already-computed parents, in FIFO order.
fn take_known(
    leaves: &[Hash],
    computed: &[Hash],
    leaf_pos: &mut usize,
    computed_pos: &mut usize,
) -> Option<Hash> {
    if *leaf_pos < leaves.len() {
        let hash = leaves[*leaf_pos];
        *leaf_pos += 1;
        Some(hash)
    } else if *computed_pos < computed.len() {
        let hash = computed[*computed_pos];
        *computed_pos += 1;
        Some(hash)
    } else {
        None
    }
}

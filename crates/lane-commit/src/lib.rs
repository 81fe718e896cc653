//! # LaneLink Commit Core
//!
//! Leaderless commit reporting for a cross-chain messaging lane.
//!
//! A set of independent nodes repeatedly agrees, tolerating up to `f` faulty
//! participants, on (a) the next contiguous range of pending cross-chain
//! messages to commit, represented compactly as a Merkle root, and (b) the
//! gas/token price observations needed to price message execution on the
//! destination chain.
//!
//! ## Module Structure
//!
//! ```text
//! lane-commit/
//! ├── domain/          # Reports, observations, config, inflight cache, codec
//! ├── algorithms/      # Merkle multi-proofs, interval + price consensus
//! ├── ports/           # ReportingPlugin API, collaborator traits + mocks
//! └── service/         # Plugin state machine, factory, retry
//! ```
//!
//! ## Consensus Round
//!
//! Each round the external consensus runtime drives four phases:
//! Observation → Report → ShouldAcceptFinalizedReport →
//! ShouldTransmitAcceptedReport. All phases are pure functions of their
//! inputs plus externally queried chain state; the only shared mutable
//! state is the inflight report cache.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use algorithms::interval::interval_consensus;
pub use algorithms::merkle::{
    verify_compute_root, HasherCtx, Keccak256Ctx, MerkleError, Proof, Tree, MAX_NUM_TREE_LEAVES,
};
pub use algorithms::prices::{deviates, sorted_middle, usd_per_1e18_token_amount};
pub use domain::{
    CommitError, CommitObservation, CommitOffchainConfig, CommitReport, CommitResult, GasPrice,
    InflightCommitReportsContainer, Interval, PriceUpdate, SendRequest, TokenPrice,
};
pub use ports::inbound::{ReportingPlugin, ReportingPluginConfig, ReportingPluginFactory};
pub use service::{
    retry_with_backoff, CommitPluginStaticConfig, CommitReportingPlugin,
    CommitReportingPluginFactory, RetryConfig,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

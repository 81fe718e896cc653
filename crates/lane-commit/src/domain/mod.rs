//! # Domain Module
//!
//! Core domain types for commit reporting: reports, observations,
//! configuration, the inflight cache, and the report wire codec.

pub mod codec;
pub mod config;
pub mod entities;
pub mod errors;
pub mod inflight;

pub use codec::{decode_commit_report, encode_commit_report, CodecError};
pub use config::CommitOffchainConfig;
pub use entities::*;
pub use errors::{CommitError, CommitResult};
pub use inflight::{
    InflightCommitReport, InflightCommitReportsContainer, InflightPriceUpdate,
    MAX_INFLIGHT_SEQ_NUM_GAP, PRICE_EXPIRY_MULTIPLIER,
};

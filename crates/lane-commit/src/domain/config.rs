//! # Offchain Configuration
//!
//! Per-lane tuning for price staleness and the inflight cache, distributed
//! to all nodes through the on-chain configuration channel.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};

/// Commit plugin offchain configuration.
///
/// Heartbeats bound how old a published price may grow before it is
/// re-published regardless of deviation; deviation thresholds (parts per
/// billion) bound how far a price may drift within a heartbeat before an
/// early update is worth its gas.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitOffchainConfig {
    /// Maximum age of a published gas price before re-publishing.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub gas_price_heartbeat: Duration,
    /// Relative gas price deviation (ppb) that forces an early update.
    pub gas_price_deviation_ppb: u64,
    /// Maximum age of a published token price before re-publishing.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub token_price_heartbeat: Duration,
    /// Relative token price deviation (ppb) that forces an early update.
    pub token_price_deviation_ppb: u64,
    /// Age at which an unconfirmed report is dropped from the inflight
    /// cache. Price entries live three times as long.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub inflight_cache_expiry: Duration,
    /// When set, observations carry no prices and reports are
    /// interval-only.
    pub price_reporting_disabled: bool,
}

impl Default for CommitOffchainConfig {
    fn default() -> Self {
        Self {
            gas_price_heartbeat: Duration::from_secs(12 * 60 * 60),
            gas_price_deviation_ppb: 50_000_000,
            token_price_heartbeat: Duration::from_secs(24 * 60 * 60),
            token_price_deviation_ppb: 50_000_000,
            inflight_cache_expiry: Duration::from_secs(3 * 60),
            price_reporting_disabled: false,
        }
    }
}

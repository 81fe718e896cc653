//! # Inflight Reports Container
//!
//! Shared cache of reports already submitted but not yet chain-confirmed,
//! and of not-yet-confirmed price updates. Pipelining unconfirmed batches is
//! what lets the lane commit faster than one batch per confirmation; the
//! cache is the node's local view of that pipeline.
//!
//! All entries are in-memory value copies behind one read-write lock; no
//! operation does I/O while holding it. The cache is constructor-injected
//! and shared (via `Arc`) between the reporting plugin and the transmission
//! path.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use lane_types::{to_hex, Address, ChainSelector, Hash, ZERO_HASH};
use parking_lot::RwLock;
use tracing::{info, warn};

use super::entities::{CommitReport, GasPrice, PriceUpdate, TokenPrice};
use super::errors::{CommitError, CommitResult};

/// Price entries outlive report entries by this factor: the cache is the
/// price truth-source between confirmation lag and heartbeat, while a
/// report entry only needs to survive until its tx confirms or reverts.
pub const PRICE_EXPIRY_MULTIPLIER: u32 = 3;

/// Maximum distance the inflight max may run ahead of the on-chain next
/// sequence number before the cache is forcibly reset. High enough for deep
/// pipelining, low enough to bound wasted revert cost when reports stop
/// confirming entirely.
pub const MAX_INFLIGHT_SEQ_NUM_GAP: u64 = 500;

/// A report awaiting chain confirmation, keyed by its Merkle root.
#[derive(Clone, Debug)]
pub struct InflightCommitReport {
    /// The accepted report.
    pub report: CommitReport,
    created_at: SystemTime,
}

/// Price updates awaiting chain confirmation. Append-only; per-key
/// "latest" is resolved by the highest `epoch_and_round`.
#[derive(Clone, Debug)]
pub struct InflightPriceUpdate {
    /// Gas price updates carried by the accepted report.
    pub gas_prices: Vec<GasPrice>,
    /// Token price updates carried by the accepted report.
    pub token_prices: Vec<TokenPrice>,
    /// Total order across rounds (`epoch << 8 | round`).
    pub epoch_and_round: u64,
    created_at: SystemTime,
}

#[derive(Default)]
struct Inner {
    in_flight: HashMap<Hash, InflightCommitReport>,
    in_flight_price_updates: Vec<InflightPriceUpdate>,
}

/// Lock-protected cache of inflight reports and price updates with
/// time-based expiry.
pub struct InflightCommitReportsContainer {
    inner: RwLock<Inner>,
    cache_expiry: Duration,
}

impl InflightCommitReportsContainer {
    /// Create an empty container whose report entries expire after
    /// `cache_expiry` (price entries after
    /// `cache_expiry * PRICE_EXPIRY_MULTIPLIER`).
    pub fn new(cache_expiry: Duration) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            cache_expiry,
        }
    }

    /// Highest sequence number across all inflight reports, or 0 when none.
    pub fn max_inflight_seq_nr(&self) -> u64 {
        self.inner
            .read()
            .in_flight
            .values()
            .map(|entry| entry.report.interval.max)
            .max()
            .unwrap_or(0)
    }

    /// Latest unconfirmed gas price per destination selector, resolved by
    /// highest epoch-and-round regardless of insertion order.
    pub fn latest_inflight_gas_price_updates(&self) -> HashMap<ChainSelector, PriceUpdate> {
        let inner = self.inner.read();
        let mut latest: HashMap<ChainSelector, (u64, PriceUpdate)> = HashMap::new();
        for entry in &inner.in_flight_price_updates {
            for gas in &entry.gas_prices {
                let candidate = (
                    entry.epoch_and_round,
                    PriceUpdate {
                        timestamp: entry.created_at,
                        value: gas.value,
                    },
                );
                match latest.get(&gas.dest_chain_selector) {
                    Some((existing, _)) if *existing >= entry.epoch_and_round => {}
                    _ => {
                        latest.insert(gas.dest_chain_selector, candidate);
                    }
                }
            }
        }
        latest
            .into_iter()
            .map(|(selector, (_, update))| (selector, update))
            .collect()
    }

    /// Latest unconfirmed token price per token, resolved by highest
    /// epoch-and-round regardless of insertion order.
    pub fn latest_inflight_token_price_updates(&self) -> HashMap<Address, PriceUpdate> {
        let inner = self.inner.read();
        let mut latest: HashMap<Address, (u64, PriceUpdate)> = HashMap::new();
        for entry in &inner.in_flight_price_updates {
            for token_price in &entry.token_prices {
                let candidate = (
                    entry.epoch_and_round,
                    PriceUpdate {
                        timestamp: entry.created_at,
                        value: token_price.value,
                    },
                );
                match latest.get(&token_price.token) {
                    Some((existing, _)) if *existing >= entry.epoch_and_round => {}
                    _ => {
                        latest.insert(token_price.token, candidate);
                    }
                }
            }
        }
        latest
            .into_iter()
            .map(|(token, (_, update))| (token, update))
            .collect()
    }

    /// Record an accepted report. Reports with a Merkle root are keyed by
    /// it (a duplicate root is an error); price updates are appended under
    /// the round's epoch-and-round.
    pub fn add(&self, report: &CommitReport, epoch_and_round: u64) -> CommitResult<()> {
        let now = SystemTime::now();
        let mut inner = self.inner.write();

        if report.merkle_root != ZERO_HASH {
            if inner.in_flight.contains_key(&report.merkle_root) {
                return Err(CommitError::ReportAlreadyInflight);
            }
            inner.in_flight.insert(
                report.merkle_root,
                InflightCommitReport {
                    report: report.clone(),
                    created_at: now,
                },
            );
        }

        if !report.gas_prices.is_empty() || !report.token_prices.is_empty() {
            inner.in_flight_price_updates.push(InflightPriceUpdate {
                gas_prices: report.gas_prices.clone(),
                token_prices: report.token_prices.clone(),
                epoch_and_round,
                created_at: now,
            });
        }
        Ok(())
    }

    /// Drop entries old enough to have been confirmed or reverted on-chain.
    pub fn expire(&self) {
        let now = SystemTime::now();
        let report_expiry = self.cache_expiry;
        let price_expiry = self.cache_expiry * PRICE_EXPIRY_MULTIPLIER;
        let mut inner = self.inner.write();

        inner.in_flight.retain(|root, entry| {
            let keep = age(now, entry.created_at) < report_expiry;
            if !keep {
                info!(
                    merkle_root = %to_hex(root),
                    min_seq_nr = entry.report.interval.min,
                    max_seq_nr = entry.report.interval.max,
                    "inflight report expired"
                );
            }
            keep
        });
        inner
            .in_flight_price_updates
            .retain(|entry| age(now, entry.created_at) < price_expiry);
    }

    /// Drop everything. Used when the inflight range has run too far ahead
    /// of the chain and the lane must restart from the on-chain minimum.
    pub fn reset(&self) {
        warn!("resetting inflight cache");
        let mut inner = self.inner.write();
        inner.in_flight.clear();
        inner.in_flight_price_updates.clear();
    }
}

fn age(now: SystemTime, created_at: SystemTime) -> Duration {
    now.duration_since(created_at).unwrap_or(Duration::ZERO)
}

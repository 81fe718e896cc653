//! # Inbound Ports
//!
//! The API surface the external consensus runtime drives, once per round:
//! Query → Observation → Report → ShouldAcceptFinalizedReport →
//! ShouldTransmitAcceptedReport.
//!
//! Rounds for a given plugin instance are serialized by the runtime; the
//! plugin itself does not need reentrancy across rounds. Observations and
//! reports cross the wire as opaque byte vectors.

use async_trait::async_trait;
use lane_types::ReportTimestamp;

use crate::domain::errors::CommitResult;

/// A reporting plugin driven by the consensus runtime.
///
/// Every phase is a pure function of its inputs plus externally queried
/// chain state; phases share nothing between invocations except the
/// inflight cache.
#[async_trait]
pub trait ReportingPlugin: Send + Sync {
    /// Produce the round's query. The commit plugin never asks peers for
    /// extra data up front, so this is always empty.
    async fn query(&self, round: ReportTimestamp) -> CommitResult<Vec<u8>>;

    /// Compute this node's observation for the round: the sequence range
    /// ready to commit plus gas/token price observations.
    async fn observation(&self, round: ReportTimestamp, query: &[u8]) -> CommitResult<Vec<u8>>;

    /// Combine the quorum-selected observations into a report.
    /// `Ok(None)` means there is nothing worth writing on-chain this round.
    async fn report(
        &self,
        round: ReportTimestamp,
        query: &[u8],
        observations: &[Vec<u8>],
    ) -> CommitResult<Option<Vec<u8>>>;

    /// Decide whether a finalized report should be accepted for
    /// transmission.
    async fn should_accept_finalized_report(
        &self,
        round: ReportTimestamp,
        report: &[u8],
    ) -> CommitResult<bool>;

    /// Re-check an accepted report immediately before transmission; chain
    /// state may have advanced since acceptance.
    async fn should_transmit_accepted_report(
        &self,
        round: ReportTimestamp,
        report: &[u8],
    ) -> CommitResult<bool>;
}

/// Per-configuration-change inputs handed to the factory by the consensus
/// runtime.
#[derive(Clone, Debug, Default)]
pub struct ReportingPluginConfig {
    /// Opaque on-chain configuration blob.
    pub onchain_config: Vec<u8>,
    /// Opaque off-chain configuration blob.
    pub offchain_config: Vec<u8>,
    /// Maximum tolerated faulty participants.
    pub f: usize,
}

/// Builds a fresh reporting plugin whenever the on-chain configuration
/// changes. Construction failure halts the lane, so implementations retry
/// until they succeed.
#[async_trait]
pub trait ReportingPluginFactory: Send + Sync {
    /// The plugin type produced.
    type Plugin: ReportingPlugin;

    /// Build a plugin for the given configuration.
    async fn new_reporting_plugin(
        &self,
        config: ReportingPluginConfig,
    ) -> CommitResult<Self::Plugin>;
}

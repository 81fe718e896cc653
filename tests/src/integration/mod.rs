//! Cross-module integration scenarios.
//!
//! Each scenario drives real plugin instances against shared in-memory
//! collaborators, so the full path from observation bytes to encoded
//! report to staleness gating is exercised together.

mod commit_flow;
mod factory_bootstrap;
mod price_flow;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use lane_commit::domain::{CommitObservation, CommitOffchainConfig, Interval};
use lane_commit::ports::outbound::{
    MockCommitStore, MockOffRamp, MockOnRamp, MockPriceGetter, MockPriceRegistry,
};
use lane_commit::service::{CommitPluginParams, CommitReportingPlugin};
use lane_commit::InflightCommitReportsContainer;
use lane_types::{Address, ChainSelector, ReportTimestamp, U256};

pub const SOURCE_SELECTOR: ChainSelector = 4_001;
pub const SOURCE_NATIVE: Address = [0x5e; 20];
pub const FEE_TOKEN: Address = [0x11; 20];
pub const BRIDGE_TOKEN: Address = [0x22; 20];

/// Shared chain-side state plus one plugin ("node") built over it.
pub struct Lane {
    pub commit_store: Arc<MockCommitStore>,
    pub onramp: Arc<MockOnRamp>,
    pub registry: Arc<MockPriceRegistry>,
    pub price_getter: Arc<MockPriceGetter>,
    config: CommitOffchainConfig,
}

impl Lane {
    pub fn new() -> Self {
        let commit_store = Arc::new(MockCommitStore::new(1));
        let onramp = Arc::new(MockOnRamp::default());

        let registry = Arc::new(MockPriceRegistry::default());
        registry.fee_tokens.lock().push(FEE_TOKEN);
        registry.decimals.lock().insert(FEE_TOKEN, 18);
        registry.decimals.lock().insert(BRIDGE_TOKEN, 6);

        let price_getter = Arc::new(MockPriceGetter::default());
        {
            let mut prices = price_getter.prices.lock();
            prices.insert(SOURCE_NATIVE, usd(100));
            prices.insert(FEE_TOKEN, usd(2));
            prices.insert(BRIDGE_TOKEN, usd(1));
        }

        Self {
            commit_store,
            onramp,
            registry,
            price_getter,
            config: CommitOffchainConfig::default(),
        }
    }

    /// Build one node over the lane's shared chain state. Every node gets
    /// its own inflight cache, as on a real oracle.
    pub fn node(&self) -> CommitReportingPlugin {
        let offramp = Arc::new(MockOffRamp::default());
        offramp.token_set.lock().destination_tokens = vec![BRIDGE_TOKEN];

        CommitReportingPlugin::new(CommitPluginParams {
            source_chain_selector: SOURCE_SELECTOR,
            source_native: SOURCE_NATIVE,
            onramp: self.onramp.clone(),
            offramp,
            commit_store: self.commit_store.clone(),
            dest_price_registry: self.registry.clone(),
            price_getter: self.price_getter.clone(),
            gas_estimator: self.commit_store.estimator.clone(),
            offchain_config: self.config.clone(),
            f: 1,
            inflight: Arc::new(InflightCommitReportsContainer::new(
                Duration::from_secs(180),
            )),
        })
    }

    /// Append contiguous send requests `[min..=max]` to the on-ramp.
    pub fn publish_messages(&self, min: u64, max: u64) {
        let filled = MockOnRamp::with_range(min, max);
        self.onramp
            .requests
            .lock()
            .extend(filled.requests.lock().iter().copied());
    }

    /// Simulate on-chain confirmation of a committed range.
    pub fn confirm_through(&self, max_committed: u64) {
        *self.commit_store.next_seq_num.lock() = max_committed + 1;
    }
}

pub fn usd(dollars: u64) -> U256 {
    U256::from(dollars) * U256::exp10(18)
}

pub fn round(epoch: u32, round_id: u8) -> ReportTimestamp {
    ReportTimestamp::new(epoch, round_id)
}

pub fn parse_observation(bytes: &[u8]) -> CommitObservation {
    serde_json::from_slice(bytes).expect("observation must parse")
}

/// A quorum of identical honest observations plus one silent node, as the
/// consensus runtime would hand them to the report phase.
pub fn quorum_observations(observed: &CommitObservation) -> Vec<Vec<u8>> {
    let silent = CommitObservation {
        interval: Interval::new(0, 0),
        source_gas_price_usd: Some(U256::zero()),
        token_prices_usd: observed
            .token_prices_usd
            .keys()
            .map(|token| (*token, Some(U256::zero())))
            .collect::<BTreeMap<_, _>>(),
    };
    vec![
        serde_json::to_vec(observed).unwrap(),
        serde_json::to_vec(observed).unwrap(),
        serde_json::to_vec(observed).unwrap(),
        serde_json::to_vec(&silent).unwrap(),
    ]
}

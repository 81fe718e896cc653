//! # Outbound Ports
//!
//! Collaborator traits consumed by the commit core (chain readers, price
//! oracles, the persisted price service), with in-memory mock
//! implementations for testing.
//!
//! Implementations live behind factories selected by protocol version; the
//! core only ever sees these capability sets.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use lane_types::{Address, ChainSelector, U256};
use parking_lot::Mutex;

use crate::algorithms::prices;
use crate::domain::codec;
use crate::domain::config::CommitOffchainConfig;
use crate::domain::entities::{
    CommitReport, GasPriceLog, OffRampTokens, SendRequest, TokenPriceLog,
};
use crate::domain::errors::{CommitError, CommitResult};

/// Reader for the destination chain's commit-tracking contract.
#[async_trait]
pub trait CommitStoreReader: Send + Sync {
    /// Next sequence number the contract expects to be committed.
    async fn expected_next_sequence_number(&self) -> CommitResult<u64>;

    /// Epoch-and-round of the last accepted price-only report.
    async fn latest_price_epoch_and_round(&self) -> CommitResult<u64>;

    /// Apply a configuration change; returns the current price registry
    /// address.
    async fn change_config(
        &self,
        onchain_config: &[u8],
        offchain_config: &[u8],
    ) -> CommitResult<Address>;

    /// Current offchain configuration.
    async fn offchain_config(&self) -> CommitResult<CommitOffchainConfig>;

    /// Gas price estimator appropriate for the configured lane.
    async fn gas_price_estimator(&self) -> CommitResult<Arc<dyn GasPriceEstimator>>;

    /// Encode a report into the contract's binary layout.
    fn encode_commit_report(&self, report: &CommitReport) -> CommitResult<Vec<u8>>;

    /// Decode a report from the contract's binary layout.
    fn decode_commit_report(&self, bytes: &[u8]) -> CommitResult<CommitReport>;

    /// True when the contract is down, paused, or cursed; the protocol
    /// must halt for this lane.
    async fn is_down(&self) -> CommitResult<bool>;
}

/// Reader for the source chain's on-ramp contract.
#[async_trait]
pub trait OnRampReader: Send + Sync {
    /// Send requests with sequence numbers in `[min, max]`, ascending.
    /// With `finalized_only`, only requests from finalized blocks.
    async fn send_requests_between_seq_nums(
        &self,
        min: u64,
        max: u64,
        finalized_only: bool,
    ) -> CommitResult<Vec<SendRequest>>;

    /// True when the source chain has been cursed by the risk-management
    /// network.
    async fn is_source_cursed(&self) -> CommitResult<bool>;
}

/// Reader for the destination chain's off-ramp contract.
#[async_trait]
pub trait OffRampReader: Send + Sync {
    /// Bridgeable token sets supported by the off-ramp.
    async fn tokens(&self) -> CommitResult<OffRampTokens>;
}

/// Reader for the destination chain's price registry contract.
#[async_trait]
pub trait PriceRegistryReader: Send + Sync {
    /// Tokens accepted as execution fee payment.
    async fn fee_tokens(&self) -> CommitResult<Vec<Address>>;

    /// Decimals for each requested token, in request order.
    async fn tokens_decimals(&self, tokens: &[Address]) -> CommitResult<Vec<u8>>;

    /// Confirmed token price updates strictly newer than `after`,
    /// ascending by timestamp.
    async fn token_price_updates_created_after(
        &self,
        after: SystemTime,
    ) -> CommitResult<Vec<TokenPriceLog>>;

    /// Confirmed gas price updates for one chain strictly newer than
    /// `after`, ascending by timestamp.
    async fn gas_price_updates_created_after(
        &self,
        selector: ChainSelector,
        after: SystemTime,
    ) -> CommitResult<Vec<GasPriceLog>>;
}

/// Builds price registry readers for a given on-chain address. The factory
/// swaps readers whenever the registry address changes on-chain.
#[async_trait]
pub trait PriceRegistryProvider: Send + Sync {
    /// Construct a reader bound to `address`.
    async fn price_registry_reader(
        &self,
        address: Address,
    ) -> CommitResult<Arc<dyn PriceRegistryReader>>;
}

/// External price oracle. Implementations should resolve every requested
/// token; callers must treat a missing entry as a failed observation.
#[async_trait]
pub trait PriceGetter: Send + Sync {
    /// USD prices (1e18 scale, per full token) for the requested tokens.
    async fn token_prices_usd(
        &self,
        tokens: &[Address],
    ) -> CommitResult<HashMap<Address, U256>>;
}

/// Source-chain gas pricing strategy. Median and deviation live here so
/// lanes with exotic fee markets (data-availability components, fee
/// multipliers) can override them without touching the plugin.
#[async_trait]
pub trait GasPriceEstimator: Send + Sync {
    /// Current gas price in native units.
    async fn gas_price(&self) -> CommitResult<U256>;

    /// Convert a native gas price to USD (1e18 scale) given the USD price
    /// of the native token.
    fn denote_in_usd(&self, gas_price: U256, native_price_usd: U256) -> CommitResult<U256>;

    /// Median of a set of USD gas price observations.
    fn median(&self, observations: &[U256]) -> CommitResult<U256>;

    /// Whether two USD gas prices deviate enough to warrant an update.
    fn deviates(&self, x1: U256, x2: U256) -> CommitResult<bool>;
}

/// Persisted cross-lane price cache, refreshed in the background by its
/// own service; the factory pushes fresh estimator/reader handles into it
/// on every configuration change.
#[async_trait]
pub trait PriceService: Send + Sync {
    /// Latest persisted gas and token prices for a destination chain.
    async fn gas_and_token_prices(
        &self,
        dest_chain_selector: ChainSelector,
    ) -> CommitResult<(HashMap<ChainSelector, U256>, HashMap<Address, U256>)>;

    /// Swap the dynamic collaborators after a configuration change.
    async fn update_dynamic_config(
        &self,
        gas_estimator: Arc<dyn GasPriceEstimator>,
        price_registry: Arc<dyn PriceRegistryReader>,
    ) -> CommitResult<()>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Mock commit store with settable chain state and the real report codec.
pub struct MockCommitStore {
    /// Next expected sequence number.
    pub next_seq_num: Mutex<u64>,
    /// Last price report epoch-and-round.
    pub price_epoch_and_round: Mutex<u64>,
    /// Down/paused flag.
    pub down: Mutex<bool>,
    /// Address returned by `change_config`.
    pub price_registry_address: Mutex<Address>,
    /// Offchain configuration returned to the factory.
    pub config: Mutex<CommitOffchainConfig>,
    /// Estimator handed to the factory.
    pub estimator: Arc<FixedGasPriceEstimator>,
    /// Remaining `change_config` calls that fail, for retry tests.
    pub change_config_failures: Mutex<u32>,
}

impl MockCommitStore {
    /// Commit store expecting `next_seq_num` as the next commit.
    pub fn new(next_seq_num: u64) -> Self {
        Self {
            next_seq_num: Mutex::new(next_seq_num),
            price_epoch_and_round: Mutex::new(0),
            down: Mutex::new(false),
            price_registry_address: Mutex::new([0u8; 20]),
            config: Mutex::new(CommitOffchainConfig::default()),
            estimator: Arc::new(FixedGasPriceEstimator::new(
                U256::from(3_000_000_000u64),
                50_000_000,
            )),
            change_config_failures: Mutex::new(0),
        }
    }
}

#[async_trait]
impl CommitStoreReader for MockCommitStore {
    async fn expected_next_sequence_number(&self) -> CommitResult<u64> {
        Ok(*self.next_seq_num.lock())
    }

    async fn latest_price_epoch_and_round(&self) -> CommitResult<u64> {
        Ok(*self.price_epoch_and_round.lock())
    }

    async fn change_config(
        &self,
        _onchain_config: &[u8],
        _offchain_config: &[u8],
    ) -> CommitResult<Address> {
        let mut failures = self.change_config_failures.lock();
        if *failures > 0 {
            *failures -= 1;
            return Err(CommitError::ChainRead("change config failed".into()));
        }
        Ok(*self.price_registry_address.lock())
    }

    async fn offchain_config(&self) -> CommitResult<CommitOffchainConfig> {
        Ok(self.config.lock().clone())
    }

    async fn gas_price_estimator(&self) -> CommitResult<Arc<dyn GasPriceEstimator>> {
        Ok(self.estimator.clone())
    }

    fn encode_commit_report(&self, report: &CommitReport) -> CommitResult<Vec<u8>> {
        Ok(codec::encode_commit_report(report))
    }

    fn decode_commit_report(&self, bytes: &[u8]) -> CommitResult<CommitReport> {
        Ok(codec::decode_commit_report(bytes)?)
    }

    async fn is_down(&self) -> CommitResult<bool> {
        Ok(*self.down.lock())
    }
}

/// Mock on-ramp backed by an in-memory request log.
#[derive(Default)]
pub struct MockOnRamp {
    /// All known send requests, ascending by sequence number.
    pub requests: Mutex<Vec<SendRequest>>,
    /// Cursed flag.
    pub cursed: Mutex<bool>,
}

impl MockOnRamp {
    /// On-ramp holding contiguous requests `[min..=max]` with synthetic
    /// leaf hashes.
    pub fn with_range(min: u64, max: u64) -> Self {
        let requests = (min..=max)
            .map(|sequence_number| SendRequest {
                sequence_number,
                hash: synthetic_leaf(sequence_number),
            })
            .collect();
        Self {
            requests: Mutex::new(requests),
            cursed: Mutex::new(false),
        }
    }
}

/// Deterministic per-sequence-number leaf hash for tests.
pub fn synthetic_leaf(sequence_number: u64) -> [u8; 32] {
    let mut hash = [0u8; 32];
    hash[24..].copy_from_slice(&sequence_number.to_be_bytes());
    hash[0] = 0xfe;
    hash
}

#[async_trait]
impl OnRampReader for MockOnRamp {
    async fn send_requests_between_seq_nums(
        &self,
        min: u64,
        max: u64,
        _finalized_only: bool,
    ) -> CommitResult<Vec<SendRequest>> {
        Ok(self
            .requests
            .lock()
            .iter()
            .filter(|req| req.sequence_number >= min && req.sequence_number <= max)
            .copied()
            .collect())
    }

    async fn is_source_cursed(&self) -> CommitResult<bool> {
        Ok(*self.cursed.lock())
    }
}

/// Mock off-ramp with a fixed token set.
#[derive(Default)]
pub struct MockOffRamp {
    /// Supported token sets.
    pub token_set: Mutex<OffRampTokens>,
}

#[async_trait]
impl OffRampReader for MockOffRamp {
    async fn tokens(&self) -> CommitResult<OffRampTokens> {
        Ok(self.token_set.lock().clone())
    }
}

/// Mock price registry backed by in-memory logs.
#[derive(Default)]
pub struct MockPriceRegistry {
    /// Fee-payment tokens.
    pub fee_tokens: Mutex<Vec<Address>>,
    /// Token decimals.
    pub decimals: Mutex<HashMap<Address, u8>>,
    /// Confirmed token price rows, ascending by timestamp.
    pub token_logs: Mutex<Vec<TokenPriceLog>>,
    /// Confirmed gas price rows per chain, ascending by timestamp.
    pub gas_logs: Mutex<HashMap<ChainSelector, Vec<GasPriceLog>>>,
}

#[async_trait]
impl PriceRegistryReader for MockPriceRegistry {
    async fn fee_tokens(&self) -> CommitResult<Vec<Address>> {
        Ok(self.fee_tokens.lock().clone())
    }

    async fn tokens_decimals(&self, tokens: &[Address]) -> CommitResult<Vec<u8>> {
        let decimals = self.decimals.lock();
        tokens
            .iter()
            .map(|token| {
                decimals.get(token).copied().ok_or_else(|| {
                    CommitError::ChainRead(format!(
                        "unknown token decimals: {}",
                        lane_types::to_hex(token)
                    ))
                })
            })
            .collect()
    }

    async fn token_price_updates_created_after(
        &self,
        after: SystemTime,
    ) -> CommitResult<Vec<TokenPriceLog>> {
        Ok(self
            .token_logs
            .lock()
            .iter()
            .filter(|log| log.timestamp > after)
            .copied()
            .collect())
    }

    async fn gas_price_updates_created_after(
        &self,
        selector: ChainSelector,
        after: SystemTime,
    ) -> CommitResult<Vec<GasPriceLog>> {
        Ok(self
            .gas_logs
            .lock()
            .get(&selector)
            .map(|logs| {
                logs.iter()
                    .filter(|log| log.timestamp > after)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Mock provider returning pre-registered registries and recording every
/// build for no-op-swap assertions.
#[derive(Default)]
pub struct MockPriceRegistryProvider {
    /// Registries by address; addresses without an entry get a fresh
    /// default registry.
    pub registries: Mutex<HashMap<Address, Arc<MockPriceRegistry>>>,
    /// Addresses readers were built for, in order.
    pub built: Mutex<Vec<Address>>,
}

#[async_trait]
impl PriceRegistryProvider for MockPriceRegistryProvider {
    async fn price_registry_reader(
        &self,
        address: Address,
    ) -> CommitResult<Arc<dyn PriceRegistryReader>> {
        self.built.lock().push(address);
        let registry = self
            .registries
            .lock()
            .entry(address)
            .or_insert_with(|| Arc::new(MockPriceRegistry::default()))
            .clone();
        Ok(registry)
    }
}

/// Mock price oracle returning whatever subset of the requested tokens it
/// knows; the plugin is responsible for treating gaps as failures.
#[derive(Default)]
pub struct MockPriceGetter {
    /// USD price per full token.
    pub prices: Mutex<HashMap<Address, U256>>,
}

#[async_trait]
impl PriceGetter for MockPriceGetter {
    async fn token_prices_usd(
        &self,
        tokens: &[Address],
    ) -> CommitResult<HashMap<Address, U256>> {
        let prices = self.prices.lock();
        Ok(tokens
            .iter()
            .filter_map(|token| prices.get(token).map(|price| (*token, *price)))
            .collect())
    }
}

/// Gas price estimator with a settable price, median by sorted-middle, and
/// ppb deviation.
pub struct FixedGasPriceEstimator {
    /// Current native gas price.
    pub price: Mutex<U256>,
    /// Deviation threshold in parts per billion.
    pub deviation_ppb: u64,
}

impl FixedGasPriceEstimator {
    /// Estimator returning `price` with the given deviation threshold.
    pub fn new(price: U256, deviation_ppb: u64) -> Self {
        Self {
            price: Mutex::new(price),
            deviation_ppb,
        }
    }
}

#[async_trait]
impl GasPriceEstimator for FixedGasPriceEstimator {
    async fn gas_price(&self) -> CommitResult<U256> {
        Ok(*self.price.lock())
    }

    fn denote_in_usd(&self, gas_price: U256, native_price_usd: U256) -> CommitResult<U256> {
        Ok(gas_price * native_price_usd / U256::exp10(18))
    }

    fn median(&self, observations: &[U256]) -> CommitResult<U256> {
        prices::sorted_middle(observations).ok_or(CommitError::MissingGasPrice)
    }

    fn deviates(&self, x1: U256, x2: U256) -> CommitResult<bool> {
        Ok(prices::deviates(x1, x2, self.deviation_ppb))
    }
}

/// Mock price service recording dynamic-config pushes.
#[derive(Default)]
pub struct MockPriceService {
    /// Number of `update_dynamic_config` calls.
    pub config_pushes: Mutex<u32>,
    /// Persisted gas prices returned to callers.
    pub gas_prices: Mutex<HashMap<ChainSelector, U256>>,
    /// Persisted token prices returned to callers.
    pub token_prices: Mutex<HashMap<Address, U256>>,
}

#[async_trait]
impl PriceService for MockPriceService {
    async fn gas_and_token_prices(
        &self,
        _dest_chain_selector: ChainSelector,
    ) -> CommitResult<(HashMap<ChainSelector, U256>, HashMap<Address, U256>)> {
        Ok((self.gas_prices.lock().clone(), self.token_prices.lock().clone()))
    }

    async fn update_dynamic_config(
        &self,
        _gas_estimator: Arc<dyn GasPriceEstimator>,
        _price_registry: Arc<dyn PriceRegistryReader>,
    ) -> CommitResult<()> {
        *self.config_pushes.lock() += 1;
        Ok(())
    }
}

//! # Commit Reporting Plugin
//!
//! The four-phase state machine driven once per consensus round:
//! Observation computes this node's candidate interval and prices, Report
//! merges the quorum's observations into one attestation, and the two
//! Should* phases gate acceptance and transmission against chain state
//! that may have moved since the report was built.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use lane_types::{to_hex, Address, ChainSelector, ReportTimestamp, U256, ZERO_HASH};
use tracing::{debug, info, warn};

use crate::algorithms::calc::{contiguous_seq_nums, flatten_unique_sorted};
use crate::algorithms::interval::interval_consensus;
use crate::algorithms::merkle::{Keccak256Ctx, Tree, MAX_NUM_TREE_LEAVES};
use crate::algorithms::prices::{deviates, sorted_middle, usd_per_1e18_token_amount};
use crate::domain::config::CommitOffchainConfig;
use crate::domain::entities::{
    CommitObservation, CommitReport, GasPrice, Interval, PriceUpdate, TokenPrice,
};
use crate::domain::errors::{CommitError, CommitResult};
use crate::domain::inflight::{InflightCommitReportsContainer, MAX_INFLIGHT_SEQ_NUM_GAP};
use crate::ports::inbound::ReportingPlugin;
use crate::ports::outbound::{
    CommitStoreReader, GasPriceEstimator, OffRampReader, OnRampReader, PriceGetter,
    PriceRegistryReader,
};

/// Number of on-ramp messages scanned per observation: twice the maximum
/// tree size, so one full batch can always be filled even under bursts
/// without hurting reader performance.
pub const ON_RAMP_MESSAGES_SCAN_LIMIT: u64 = 2 * MAX_NUM_TREE_LEAVES as u64;

/// Everything a plugin instance needs for one configuration epoch.
pub struct CommitPluginParams {
    /// Selector of the lane's source chain.
    pub source_chain_selector: ChainSelector,
    /// Wrapped-native token of the source chain, used to price gas in USD.
    pub source_native: Address,
    /// Source on-ramp reader.
    pub onramp: Arc<dyn OnRampReader>,
    /// Destination off-ramp reader.
    pub offramp: Arc<dyn OffRampReader>,
    /// Destination commit store reader.
    pub commit_store: Arc<dyn CommitStoreReader>,
    /// Destination price registry reader (current configuration epoch).
    pub dest_price_registry: Arc<dyn PriceRegistryReader>,
    /// External price oracle.
    pub price_getter: Arc<dyn PriceGetter>,
    /// Source gas pricing strategy.
    pub gas_estimator: Arc<dyn GasPriceEstimator>,
    /// Offchain tuning.
    pub offchain_config: CommitOffchainConfig,
    /// Maximum tolerated faulty participants.
    pub f: usize,
    /// Shared inflight cache.
    pub inflight: Arc<InflightCommitReportsContainer>,
}

/// The commit reporting plugin. One instance per configuration epoch;
/// rounds are serialized by the consensus runtime.
pub struct CommitReportingPlugin {
    source_chain_selector: ChainSelector,
    source_native: Address,
    onramp: Arc<dyn OnRampReader>,
    offramp: Arc<dyn OffRampReader>,
    commit_store: Arc<dyn CommitStoreReader>,
    dest_price_registry: Arc<dyn PriceRegistryReader>,
    price_getter: Arc<dyn PriceGetter>,
    gas_estimator: Arc<dyn GasPriceEstimator>,
    offchain_config: CommitOffchainConfig,
    f: usize,
    inflight: Arc<InflightCommitReportsContainer>,
}

impl CommitReportingPlugin {
    /// Build a plugin from its collaborators.
    pub fn new(params: CommitPluginParams) -> Self {
        Self {
            source_chain_selector: params.source_chain_selector,
            source_native: params.source_native,
            onramp: params.onramp,
            offramp: params.offramp,
            commit_store: params.commit_store,
            dest_price_registry: params.dest_price_registry,
            price_getter: params.price_getter,
            gas_estimator: params.gas_estimator,
            offchain_config: params.offchain_config,
            f: params.f,
            inflight: params.inflight,
        }
    }

    /// The shared inflight cache, for the transmission path and tests.
    pub fn inflight_reports(&self) -> Arc<InflightCommitReportsContainer> {
        self.inflight.clone()
    }

    async fn chain_healthy(&self) -> CommitResult<bool> {
        Ok(!self.commit_store.is_down().await? && !self.onramp.is_source_cursed().await?)
    }

    async fn ensure_chain_healthy(&self) -> CommitResult<()> {
        if self.commit_store.is_down().await? {
            return Err(CommitError::CommitStoreDown);
        }
        if self.onramp.is_source_cursed().await? {
            return Err(CommitError::SourceCursed);
        }
        Ok(())
    }

    /// Next sequence number to build on, considering both the chain and the
    /// local inflight pipeline: `(inflight_next, onchain_next)`.
    ///
    /// When the inflight max has run more than [`MAX_INFLIGHT_SEQ_NUM_GAP`]
    /// past the chain, reports have stopped confirming entirely; the cache
    /// is reset and the lane restarts from the chain's minimum.
    async fn next_min_seq_num(&self) -> CommitResult<(u64, u64)> {
        let next_onchain = self.commit_store.expected_next_sequence_number().await?;
        let max_inflight = self.inflight.max_inflight_seq_nr();
        if max_inflight > next_onchain && max_inflight - next_onchain > MAX_INFLIGHT_SEQ_NUM_GAP {
            self.inflight.reset();
            return Ok((next_onchain, next_onchain));
        }
        Ok((next_onchain.max(max_inflight + 1), next_onchain))
    }

    /// Scan the on-ramp for the next batch. `(0, 0)` when no messages are
    /// waiting; the observation may still carry price updates.
    async fn calculate_min_max_sequence_numbers(&self) -> CommitResult<(u64, u64)> {
        let (next_inflight_min, _) = self.next_min_seq_num().await?;
        let requests = self
            .onramp
            .send_requests_between_seq_nums(
                next_inflight_min,
                next_inflight_min + ON_RAMP_MESSAGES_SCAN_LIMIT,
                true,
            )
            .await?;
        if requests.is_empty() {
            debug!(min_seq_nr = next_inflight_min, "no new send requests");
            return Ok((0, 0));
        }

        let seq_nums: Vec<u64> = requests.iter().map(|req| req.sequence_number).collect();
        let min = seq_nums[0];
        let max = seq_nums[seq_nums.len() - 1];
        if min != next_inflight_min {
            // Still report: even partial views have value. If every node is
            // missing a different single log they can still assemble a
            // valid report together.
            warn!(expected = next_inflight_min, got = min, "missing sequence number range");
        }
        if !contiguous_seq_nums(min, max, &seq_nums) {
            return Err(CommitError::SequenceGap { min, max });
        }
        Ok((min, max))
    }

    /// Union of fee tokens and bridgeable destination tokens, sorted and
    /// deduplicated for deterministic queries.
    async fn destination_tokens(&self) -> CommitResult<Vec<Address>> {
        let fee_tokens = self.dest_price_registry.fee_tokens().await?;
        let bridgeable = self.offramp.tokens().await?.destination_tokens;
        Ok(flatten_unique_sorted(&[&fee_tokens, &bridgeable]))
    }

    /// Observe the source gas price and all destination token prices, USD
    /// at 1e18 scale. Every queried token must resolve.
    async fn generate_price_updates(
        &self,
        dest_tokens: &[Address],
    ) -> CommitResult<(Option<U256>, BTreeMap<Address, Option<U256>>)> {
        // Include the source native token in the query as the way to price
        // source gas in USD.
        let query_tokens = flatten_unique_sorted(&[&[self.source_native], dest_tokens]);
        let raw_prices = self.price_getter.token_prices_usd(&query_tokens).await?;
        for token in &query_tokens {
            if !raw_prices.contains_key(token) {
                return Err(CommitError::MissingTokenPrice(*token));
            }
        }
        let native_price_usd = raw_prices[&self.source_native];

        let decimals = self.dest_price_registry.tokens_decimals(dest_tokens).await?;
        if decimals.len() != dest_tokens.len() {
            return Err(CommitError::ChainRead(format!(
                "got {} decimals for {} tokens",
                decimals.len(),
                dest_tokens.len()
            )));
        }

        let mut token_prices_usd = BTreeMap::new();
        for (token, token_decimals) in dest_tokens.iter().zip(decimals) {
            token_prices_usd.insert(
                *token,
                Some(usd_per_1e18_token_amount(raw_prices[token], token_decimals)),
            );
        }

        let gas_price = self.gas_estimator.gas_price().await?;
        let gas_price_usd = self.gas_estimator.denote_in_usd(gas_price, native_price_usd)?;
        debug!(
            gas_price_native = %gas_price,
            gas_price_usd = %gas_price_usd,
            native_price_usd = %native_price_usd,
            "observed gas price"
        );
        Ok((Some(gas_price_usd), token_prices_usd))
    }

    /// Latest known gas price for the lane's source chain. Gas fluctuates
    /// quickly and many updates may be inflight, so an inflight value is
    /// the truth source whenever one exists.
    async fn latest_gas_price_update(
        &self,
        now: SystemTime,
        check_inflight: bool,
    ) -> CommitResult<Option<PriceUpdate>> {
        if check_inflight {
            if let Some(update) = self
                .inflight
                .latest_inflight_gas_price_updates()
                .get(&self.source_chain_selector)
            {
                debug!(value = %update.value, "latest gas price from inflight");
                return Ok(Some(*update));
            }
        }

        let logs = self
            .dest_price_registry
            .gas_price_updates_created_after(
                self.source_chain_selector,
                now - self.offchain_config.gas_price_heartbeat,
            )
            .await?;
        let mut latest: Option<PriceUpdate> = None;
        for log in logs {
            // Rows arrive ascending by timestamp.
            if latest.map_or(true, |existing| log.timestamp >= existing.timestamp) {
                latest = Some(PriceUpdate {
                    timestamp: log.timestamp,
                    value: log.value,
                });
            }
        }
        Ok(latest)
    }

    /// Latest known token prices within the heartbeat, merged with the
    /// inflight cache (inflight wins unless the confirmed row is strictly
    /// newer).
    async fn latest_token_price_updates(
        &self,
        now: SystemTime,
        check_inflight: bool,
    ) -> CommitResult<HashMap<Address, PriceUpdate>> {
        let logs = self
            .dest_price_registry
            .token_price_updates_created_after(now - self.offchain_config.token_price_heartbeat)
            .await?;
        let mut latest: HashMap<Address, PriceUpdate> = HashMap::new();
        for log in logs {
            match latest.get(&log.token) {
                Some(existing) if existing.timestamp > log.timestamp => {}
                _ => {
                    latest.insert(
                        log.token,
                        PriceUpdate {
                            timestamp: log.timestamp,
                            value: log.value,
                        },
                    );
                }
            }
        }
        if !check_inflight {
            return Ok(latest);
        }

        for (token, inflight_update) in self.inflight.latest_inflight_token_price_updates() {
            match latest.get(&token) {
                Some(existing) if existing.timestamp > inflight_update.timestamp => {}
                _ => {
                    latest.insert(token, inflight_update);
                }
            }
        }
        Ok(latest)
    }

    /// Select the price deltas worth publishing this round. Medians are
    /// taken per key; an update is skipped when the incumbent is younger
    /// than the heartbeat and within the deviation threshold.
    fn calculate_price_updates(
        &self,
        observations: &[CommitObservation],
        latest_gas: Option<PriceUpdate>,
        latest_tokens: &HashMap<Address, PriceUpdate>,
        now: SystemTime,
    ) -> CommitResult<(Vec<TokenPrice>, Vec<GasPrice>)> {
        let mut gas_observations = Vec::with_capacity(observations.len());
        let mut token_observations: BTreeMap<Address, Vec<U256>> = BTreeMap::new();
        for obs in observations {
            if let Some(gas) = obs.source_gas_price_usd {
                gas_observations.push(gas);
            }
            for (token, price) in &obs.token_prices_usd {
                if let Some(price) = price {
                    token_observations.entry(*token).or_default().push(*price);
                }
            }
        }

        // BTreeMap iteration ascends by token address: independently
        // computed reports must byte-match.
        let mut token_updates = Vec::new();
        for (token, observed) in token_observations {
            let median = match sorted_middle(&observed) {
                Some(median) => median,
                None => continue,
            };
            if let Some(incumbent) = latest_tokens.get(&token) {
                let updated_recently =
                    age(now, incumbent.timestamp) < self.offchain_config.token_price_heartbeat;
                let unchanged = !deviates(
                    median,
                    incumbent.value,
                    self.offchain_config.token_price_deviation_ppb,
                );
                if updated_recently && unchanged {
                    debug!(
                        token = %to_hex(&token),
                        new_price = %median,
                        existing_price = %incumbent.value,
                        "token price updated recently, skipping"
                    );
                    continue;
                }
            }
            token_updates.push(TokenPrice {
                token,
                value: median,
            });
        }

        let new_gas_price = self.gas_estimator.median(&gas_observations)?;
        let mut should_update = true;
        if let Some(incumbent) = latest_gas {
            let updated_recently =
                age(now, incumbent.timestamp) < self.offchain_config.gas_price_heartbeat;
            let deviated = self
                .gas_estimator
                .deviates(new_gas_price, incumbent.value)?;
            if updated_recently && !deviated {
                should_update = false;
            }
        }
        let mut gas_updates = Vec::new();
        if should_update {
            // The on-chain interface accepts multiple gas updates, but the
            // protocol writes exactly one per report: the source chain's
            // price, published on the destination.
            gas_updates.push(GasPrice {
                dest_chain_selector: self.source_chain_selector,
                value: new_gas_price,
            });
        }

        Ok((token_updates, gas_updates))
    }

    /// Assemble the final report. A zero min yields a price-only report;
    /// otherwise the agreed range is re-fetched and must be complete.
    async fn build_report(
        &self,
        interval: Interval,
        gas_prices: Vec<GasPrice>,
        token_prices: Vec<TokenPrice>,
    ) -> CommitResult<CommitReport> {
        if interval.min == 0 {
            return Ok(CommitReport {
                interval,
                merkle_root: ZERO_HASH,
                gas_prices,
                token_prices,
            });
        }

        // Finalized logs arrive in sequence order: the contract's sequence
        // number auto-increments.
        let requests = self
            .onramp
            .send_requests_between_seq_nums(interval.min, interval.max, true)
            .await?;
        if requests.is_empty() {
            warn!(
                min_seq_nr = interval.min,
                max_seq_nr = interval.max,
                "no messages found in agreed interval"
            );
            return Err(CommitError::TreeWithoutLeaves);
        }

        let seq_nums: Vec<u64> = requests.iter().map(|req| req.sequence_number).collect();
        if !contiguous_seq_nums(interval.min, interval.max, &seq_nums) {
            return Err(CommitError::IncompleteRange {
                min: interval.min,
                max: interval.max,
                got: requests.len(),
            });
        }

        let leaves: Vec<_> = requests.iter().map(|req| req.hash).collect();
        let tree = Tree::new(Keccak256Ctx, leaves)?;

        Ok(CommitReport {
            interval,
            merkle_root: tree.root(),
            gas_prices,
            token_prices,
        })
    }

    /// Staleness of a decoded report against current chain + inflight
    /// state. A report with a root is judged on sequence numbers alone; a
    /// price-only report is judged on its price content and its round's
    /// position relative to the last accepted price round.
    async fn is_stale_report(
        &self,
        report: &CommitReport,
        check_inflight: bool,
        round: ReportTimestamp,
    ) -> bool {
        if report.merkle_root != ZERO_HASH {
            return self.is_stale_merkle_root(report.interval, check_inflight).await;
        }

        let has_gas_update = !report.gas_prices.is_empty();
        let has_token_updates = !report.token_prices.is_empty();
        if !has_gas_update && !has_token_updates {
            // Nothing to write on-chain.
            return true;
        }
        if report.gas_prices.len() > 1 {
            warn!(
                gas_updates = report.gas_prices.len(),
                "report is stale: more than one gas price update"
            );
            return true;
        }

        let gas_stale = !has_gas_update
            || self
                .is_stale_gas_price(&report.gas_prices[0], check_inflight)
                .await;
        let token_prices_stale = !has_token_updates
            || self
                .is_stale_token_prices(&report.token_prices, check_inflight)
                .await;
        if gas_stale && token_prices_stale {
            return true;
        }

        // Price-only content is fresh; finally the round itself must be
        // newer than the last accepted price round.
        match self.commit_store.latest_price_epoch_and_round().await {
            Ok(last_price_epoch_and_round) => last_price_epoch_and_round >= round.merged(),
            // Assume a transient read issue and try again next round.
            Err(_) => true,
        }
    }

    async fn is_stale_merkle_root(&self, report_interval: Interval, check_inflight: bool) -> bool {
        let (next_inflight_min, next_onchain_min) = match self.next_min_seq_num().await {
            Ok(mins) => mins,
            // Assume a transient read issue and try again next round.
            Err(_) => return true,
        };

        if check_inflight && next_inflight_min != report_interval.min {
            // The local pipeline and the report disagree; the tx would
            // revert. Do not submit and let the caches self-heal.
            warn!(
                next_inflight_min,
                report_min = report_interval.min,
                "report is stale: inflight min does not match report min"
            );
            return true;
        }

        if !check_inflight && next_onchain_min > report_interval.min {
            info!(
                next_onchain_min,
                report_min = report_interval.min,
                "report is stale: chain already committed past report min"
            );
            return true;
        }

        // A report with a root and a valid sequence range is submitted
        // regardless of price staleness.
        false
    }

    async fn is_stale_gas_price(&self, gas_price: &GasPrice, check_inflight: bool) -> bool {
        let latest = match self
            .latest_gas_price_update(SystemTime::now(), check_inflight)
            .await
        {
            Ok(latest) => latest,
            Err(_) => return true,
        };
        let Some(latest) = latest else {
            // No known value: the update is fresh by definition.
            return false;
        };
        match self.gas_estimator.deviates(gas_price.value, latest.value) {
            Ok(deviated) => {
                if !deviated {
                    debug!(
                        latest = %latest.value,
                        proposed = %gas_price.value,
                        "gas price update is stale"
                    );
                }
                !deviated
            }
            Err(_) => true,
        }
    }

    async fn is_stale_token_prices(
        &self,
        price_updates: &[TokenPrice],
        check_inflight: bool,
    ) -> bool {
        let latest = match self
            .latest_token_price_updates(SystemTime::now(), check_inflight)
            .await
        {
            Ok(latest) => latest,
            Err(_) => return true,
        };

        // One fresh token price is enough to justify the report.
        for update in price_updates {
            let unchanged = latest.get(&update.token).is_some_and(|known| {
                !deviates(
                    update.value,
                    known.value,
                    self.offchain_config.token_price_deviation_ppb,
                )
            });
            if !unchanged {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl ReportingPlugin for CommitReportingPlugin {
    async fn query(&self, _round: ReportTimestamp) -> CommitResult<Vec<u8>> {
        // The commit plugin never requests extra data from peers.
        Ok(Vec::new())
    }

    async fn observation(&self, round: ReportTimestamp, _query: &[u8]) -> CommitResult<Vec<u8>> {
        self.ensure_chain_healthy().await?;
        self.inflight.expire();

        let (min_seq_nr, max_seq_nr) = self.calculate_min_max_sequence_numbers().await?;

        let (source_gas_price_usd, token_prices_usd) =
            if self.offchain_config.price_reporting_disabled {
                (None, BTreeMap::new())
            } else {
                let dest_tokens = self.destination_tokens().await?;
                self.generate_price_updates(&dest_tokens).await?
            };

        info!(
            min_seq_nr,
            max_seq_nr,
            epoch = round.epoch,
            round = round.round,
            "observation"
        );

        // Even an all-empty observation is returned so the other nodes can
        // still assemble a 2f+1 quorum.
        let observation = CommitObservation {
            interval: Interval::new(min_seq_nr, max_seq_nr),
            source_gas_price_usd,
            token_prices_usd,
        };
        Ok(serde_json::to_vec(&observation)?)
    }

    async fn report(
        &self,
        round: ReportTimestamp,
        _query: &[u8],
        observations: &[Vec<u8>],
    ) -> CommitResult<Option<Vec<u8>>> {
        let now = SystemTime::now();
        self.ensure_chain_healthy().await?;

        let parsed: Vec<CommitObservation> = observations
            .iter()
            .filter_map(|bytes| match serde_json::from_slice(bytes) {
                Ok(observation) => Some(observation),
                Err(err) => {
                    warn!(error = %err, "skipping unparseable observation");
                    None
                }
            })
            .collect();

        let dest_tokens = self.destination_tokens().await?;
        let valid = validate_observations(
            &dest_tokens,
            self.f,
            self.offchain_config.price_reporting_disabled,
            parsed,
        )?;

        let intervals: Vec<Interval> = valid.iter().map(|obs| obs.interval).collect();
        let agreed_interval =
            interval_consensus(intervals, self.f, MAX_NUM_TREE_LEAVES as u64)?;

        let (token_updates, gas_updates) = if self.offchain_config.price_reporting_disabled {
            (Vec::new(), Vec::new())
        } else {
            let latest_gas = self.latest_gas_price_update(now, true).await?;
            let latest_tokens = self.latest_token_price_updates(now, true).await?;
            self.calculate_price_updates(&valid, latest_gas, &latest_tokens, now)?
        };

        // Nothing worth writing on-chain this round.
        if token_updates.is_empty() && gas_updates.is_empty() && agreed_interval.max == 0 {
            info!("empty report, skipping");
            return Ok(None);
        }

        let report = self
            .build_report(agreed_interval, gas_updates, token_updates)
            .await?;
        let encoded = self.commit_store.encode_commit_report(&report)?;
        info!(
            merkle_root = %to_hex(&report.merkle_root),
            min_seq_nr = report.interval.min,
            max_seq_nr = report.interval.max,
            gas_updates = report.gas_prices.len(),
            token_updates = report.token_prices.len(),
            epoch = round.epoch,
            round = round.round,
            "report"
        );
        Ok(Some(encoded))
    }

    async fn should_accept_finalized_report(
        &self,
        round: ReportTimestamp,
        report: &[u8],
    ) -> CommitResult<bool> {
        let parsed = self.commit_store.decode_commit_report(report)?;

        // An empty report must never reach the chain.
        if parsed.is_empty() {
            warn!("rejecting empty report");
            return Ok(false);
        }
        if !self.chain_healthy().await? {
            warn!("rejecting report: chain unhealthy");
            return Ok(false);
        }
        if self.is_stale_report(&parsed, true, round).await {
            info!("rejecting stale report");
            return Ok(false);
        }

        self.inflight.add(&parsed, round.merged())?;
        info!(
            merkle_root = %to_hex(&parsed.merkle_root),
            min_seq_nr = parsed.interval.min,
            max_seq_nr = parsed.interval.max,
            "accepting finalized report"
        );
        Ok(true)
    }

    async fn should_transmit_accepted_report(
        &self,
        round: ReportTimestamp,
        report: &[u8],
    ) -> CommitResult<bool> {
        let parsed = self.commit_store.decode_commit_report(report)?;
        if !self.chain_healthy().await? {
            return Ok(false);
        }
        // State may have advanced since acceptance; once the transmitter
        // enqueues the tx the report effectively leaves the inflight set.
        let should_transmit = !self.is_stale_report(&parsed, false, round).await;
        info!(should_transmit, "should transmit accepted report");
        Ok(should_transmit)
    }
}

/// Drop parseable-but-faulty observations: a null gas price, a token count
/// not matching the destination set, a null token price, or an unsupported
/// token each mark the whole observation faulty. Strictly more than `f`
/// observations must survive, or an adversary controlling `f` nodes could
/// force a report from fewer than `f + 1` honest ones.
fn validate_observations(
    dest_tokens: &[Address],
    f: usize,
    price_reporting_disabled: bool,
    observations: Vec<CommitObservation>,
) -> CommitResult<Vec<CommitObservation>> {
    let valid: Vec<CommitObservation> = observations
        .into_iter()
        .filter(|obs| price_reporting_disabled || observation_prices_valid(dest_tokens, obs))
        .collect();

    if valid.len() <= f {
        return Err(CommitError::NotEnoughObservations {
            got: valid.len(),
            f,
        });
    }
    Ok(valid)
}

fn observation_prices_valid(dest_tokens: &[Address], obs: &CommitObservation) -> bool {
    if obs.source_gas_price_usd.is_none() {
        warn!("skipping observation: null gas price");
        return false;
    }
    if obs.token_prices_usd.len() != dest_tokens.len() {
        warn!(
            expected = dest_tokens.len(),
            got = obs.token_prices_usd.len(),
            "skipping observation: token count mismatch"
        );
        return false;
    }
    // Log every faulty price instead of short-circuiting to keep the trace
    // informative.
    let mut valid = true;
    for (token, price) in &obs.token_prices_usd {
        if price.is_none() {
            warn!(token = %to_hex(token), "null token price in observation");
            valid = false;
        }
        if !dest_tokens.contains(token) {
            warn!(token = %to_hex(token), "unsupported token in observation");
            valid = false;
        }
    }
    valid
}

fn age(now: SystemTime, then: SystemTime) -> Duration {
    now.duration_since(then).unwrap_or(Duration::ZERO)
}

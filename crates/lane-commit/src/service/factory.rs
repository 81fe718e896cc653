//! # Commit Plugin Factory
//!
//! Builds a fresh reporting plugin whenever the on-chain configuration
//! changes. Bootstrap failure would permanently disable the lane, so the
//! whole build sequence runs under retry-with-backoff until it succeeds.

use std::sync::Arc;

use async_trait::async_trait;
use lane_types::{to_hex, Address, ChainSelector};
use parking_lot::RwLock;
use tracing::info;

use super::plugin::{CommitPluginParams, CommitReportingPlugin};
use super::retry::{retry_with_backoff, RetryConfig};
use crate::domain::errors::CommitResult;
use crate::domain::inflight::InflightCommitReportsContainer;
use crate::ports::inbound::{ReportingPluginConfig, ReportingPluginFactory};
use crate::ports::outbound::{
    CommitStoreReader, OffRampReader, OnRampReader, PriceGetter, PriceRegistryProvider,
    PriceRegistryReader, PriceService,
};

/// Static per-lane configuration held by the factory across configuration
/// changes.
pub struct CommitPluginStaticConfig {
    /// Selector of the lane's source chain.
    pub source_chain_selector: ChainSelector,
    /// Wrapped-native token of the source chain.
    pub source_native: Address,
    /// Source on-ramp reader.
    pub onramp: Arc<dyn OnRampReader>,
    /// Destination off-ramp reader.
    pub offramp: Arc<dyn OffRampReader>,
    /// Destination commit store reader.
    pub commit_store: Arc<dyn CommitStoreReader>,
    /// External price oracle.
    pub price_getter: Arc<dyn PriceGetter>,
    /// Builder for price registry readers.
    pub price_registry_provider: Arc<dyn PriceRegistryProvider>,
    /// Persisted cross-lane price cache.
    pub price_service: Arc<dyn PriceService>,
    /// Bootstrap backoff schedule.
    pub retry: RetryConfig,
}

/// The current destination price registry. Address and reader are only
/// ever swapped together, behind the factory's lock.
struct DestPriceRegistry {
    address: Address,
    reader: Arc<dyn PriceRegistryReader>,
}

/// Factory producing one [`CommitReportingPlugin`] per configuration epoch.
pub struct CommitReportingPluginFactory {
    config: CommitPluginStaticConfig,
    dest_price_registry: RwLock<Option<DestPriceRegistry>>,
}

impl CommitReportingPluginFactory {
    /// Create a factory from its static configuration.
    pub fn new(config: CommitPluginStaticConfig) -> Self {
        Self {
            config,
            dest_price_registry: RwLock::new(None),
        }
    }

    /// Swap the price registry reader when the on-chain address changed.
    /// The no-op check precedes any rebuild to avoid reader churn on
    /// configuration changes that left the registry alone.
    async fn update_dynamic_readers(
        &self,
        new_address: Address,
    ) -> CommitResult<Arc<dyn PriceRegistryReader>> {
        {
            let guard = self.dest_price_registry.read();
            if let Some(current) = guard.as_ref() {
                if current.address == new_address {
                    return Ok(current.reader.clone());
                }
            }
        }

        let reader = self
            .config
            .price_registry_provider
            .price_registry_reader(new_address)
            .await?;
        *self.dest_price_registry.write() = Some(DestPriceRegistry {
            address: new_address,
            reader: reader.clone(),
        });
        info!(address = %to_hex(&new_address), "destination price registry updated");
        Ok(reader)
    }

    /// One bootstrap attempt: apply the config change, refresh the dynamic
    /// reader, fetch the offchain config and gas estimator, push both into
    /// the price service, and assemble the plugin.
    async fn build_plugin(
        &self,
        plugin_config: &ReportingPluginConfig,
    ) -> CommitResult<CommitReportingPlugin> {
        let registry_address = self
            .config
            .commit_store
            .change_config(&plugin_config.onchain_config, &plugin_config.offchain_config)
            .await?;
        let dest_price_registry = self.update_dynamic_readers(registry_address).await?;

        let offchain_config = self.config.commit_store.offchain_config().await?;
        let gas_estimator = self.config.commit_store.gas_price_estimator().await?;

        self.config
            .price_service
            .update_dynamic_config(gas_estimator.clone(), dest_price_registry.clone())
            .await?;

        let inflight = Arc::new(InflightCommitReportsContainer::new(
            offchain_config.inflight_cache_expiry,
        ));
        Ok(CommitReportingPlugin::new(CommitPluginParams {
            source_chain_selector: self.config.source_chain_selector,
            source_native: self.config.source_native,
            onramp: self.config.onramp.clone(),
            offramp: self.config.offramp.clone(),
            commit_store: self.config.commit_store.clone(),
            dest_price_registry,
            price_getter: self.config.price_getter.clone(),
            gas_estimator,
            offchain_config,
            f: plugin_config.f,
            inflight,
        }))
    }
}

#[async_trait]
impl ReportingPluginFactory for CommitReportingPluginFactory {
    type Plugin = CommitReportingPlugin;

    async fn new_reporting_plugin(
        &self,
        config: ReportingPluginConfig,
    ) -> CommitResult<CommitReportingPlugin> {
        retry_with_backoff(self.config.retry, || self.build_plugin(&config)).await
    }
}

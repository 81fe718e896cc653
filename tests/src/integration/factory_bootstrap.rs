//! Factory bootstrap: retry-until-success construction and a full round
//! driven through a factory-built plugin.

use super::*;
use lane_commit::domain::decode_commit_report;
use lane_commit::ports::inbound::{ReportingPlugin, ReportingPluginConfig, ReportingPluginFactory};
use lane_commit::ports::outbound::{MockOffRamp, MockPriceRegistryProvider, MockPriceService};
use lane_commit::service::{CommitPluginStaticConfig, CommitReportingPluginFactory};
use lane_commit::RetryConfig;
use std::sync::Arc;
use std::time::Duration;

fn factory_over(
    lane: &Lane,
) -> (
    CommitReportingPluginFactory,
    Arc<MockPriceService>,
    Arc<MockPriceRegistryProvider>,
) {
    let provider = Arc::new(MockPriceRegistryProvider::default());
    provider
        .registries
        .lock()
        .insert([0u8; 20], lane.registry.clone());

    let offramp = Arc::new(MockOffRamp::default());
    offramp.token_set.lock().destination_tokens = vec![BRIDGE_TOKEN];

    let price_service = Arc::new(MockPriceService::default());
    let factory = CommitReportingPluginFactory::new(CommitPluginStaticConfig {
        source_chain_selector: SOURCE_SELECTOR,
        source_native: SOURCE_NATIVE,
        onramp: lane.onramp.clone(),
        offramp,
        commit_store: lane.commit_store.clone(),
        price_getter: lane.price_getter.clone(),
        price_registry_provider: provider.clone(),
        price_service: price_service.clone(),
        retry: RetryConfig {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            max_attempts: None,
        },
    });
    (factory, price_service, provider)
}

#[tokio::test]
async fn test_factory_survives_transient_bootstrap_failures() {
    let lane = Lane::new();
    let (factory, price_service, _provider) = factory_over(&lane);
    *lane.commit_store.change_config_failures.lock() = 2;

    let plugin = factory
        .new_reporting_plugin(ReportingPluginConfig {
            f: 1,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(*price_service.config_pushes.lock(), 1);

    // The factory-built plugin runs a real round.
    lane.publish_messages(1, 2);
    let observed = parse_observation(&plugin.observation(round(1, 1), &[]).await.unwrap());
    assert_eq!(observed.interval, Interval::new(1, 2));

    let encoded = plugin
        .report(round(1, 1), &[], &quorum_observations(&observed))
        .await
        .unwrap()
        .expect("report expected");
    let report = decode_commit_report(&encoded).unwrap();
    assert_eq!(report.interval, Interval::new(1, 2));
    assert!(plugin
        .should_accept_finalized_report(round(1, 1), &encoded)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_reconfiguration_reuses_unchanged_registry() {
    let lane = Lane::new();
    let (factory, price_service, provider) = factory_over(&lane);
    let config = ReportingPluginConfig {
        f: 1,
        ..Default::default()
    };

    factory.new_reporting_plugin(config.clone()).await.unwrap();
    factory.new_reporting_plugin(config).await.unwrap();

    // Two configuration epochs, one registry address: the dynamic config
    // is pushed each time but the reader is only built once.
    assert_eq!(*price_service.config_pushes.lock(), 2);
    assert_eq!(provider.built.lock().len(), 1);
}

//! Price-only rounds: publication, inflight suppression, heartbeat and
//! deviation behavior across rounds.

use super::*;
use lane_commit::domain::{decode_commit_report, GasPriceLog, TokenPriceLog};
use lane_commit::ports::inbound::ReportingPlugin;
use lane_types::{ZERO_HASH, U256};
use std::time::SystemTime;

#[tokio::test]
async fn test_price_only_round_publishes_updates() {
    let lane = Lane::new();
    let node = lane.node();
    // No messages at all: the round is price-only.

    let observed = parse_observation(&node.observation(round(1, 1), &[]).await.unwrap());
    assert!(observed.interval.is_zero());

    let encoded = node
        .report(round(1, 1), &[], &quorum_observations(&observed))
        .await
        .unwrap()
        .expect("price-only report expected");
    let report = decode_commit_report(&encoded).unwrap();

    assert_eq!(report.merkle_root, ZERO_HASH);
    assert!(report.interval.is_zero());
    assert_eq!(report.gas_prices.len(), 1);
    assert_eq!(report.gas_prices[0].dest_chain_selector, SOURCE_SELECTOR);
    assert_eq!(report.token_prices.len(), 2);

    assert!(node
        .should_accept_finalized_report(round(1, 1), &encoded)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_accepted_prices_suppress_next_round() {
    let lane = Lane::new();
    let node = lane.node();

    let observed = parse_observation(&node.observation(round(1, 1), &[]).await.unwrap());
    let encoded = node
        .report(round(1, 1), &[], &quorum_observations(&observed))
        .await
        .unwrap()
        .expect("price-only report expected");
    assert!(node
        .should_accept_finalized_report(round(1, 1), &encoded)
        .await
        .unwrap());

    // Prices have not moved: with the first round's updates inflight, the
    // next round has nothing to publish.
    let observed = parse_observation(&node.observation(round(1, 2), &[]).await.unwrap());
    let result = node
        .report(round(1, 2), &[], &quorum_observations(&observed))
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_deviated_price_breaks_through_heartbeat() {
    let lane = Lane::new();
    let node = lane.node();
    let now = SystemTime::now();

    // Fresh confirmed prices matching today's observations.
    lane.registry.gas_logs.lock().insert(
        SOURCE_SELECTOR,
        vec![GasPriceLog {
            value: U256::from(300_000_000_000u64),
            timestamp: now,
        }],
    );
    *lane.registry.token_logs.lock() = vec![
        TokenPriceLog {
            token: FEE_TOKEN,
            value: usd(2),
            timestamp: now,
        },
        TokenPriceLog {
            token: BRIDGE_TOKEN,
            value: usd(1) * U256::exp10(12),
            timestamp: now,
        },
    ];

    // Unmoved market: nothing to report.
    let observed = parse_observation(&node.observation(round(1, 1), &[]).await.unwrap());
    assert!(node
        .report(round(1, 1), &[], &quorum_observations(&observed))
        .await
        .unwrap()
        .is_none());

    // The fee token doubles: its update must break through even though the
    // incumbent is fresh, and only that token is published.
    lane.price_getter.prices.lock().insert(FEE_TOKEN, usd(4));
    let observed = parse_observation(&node.observation(round(1, 2), &[]).await.unwrap());
    let encoded = node
        .report(round(1, 2), &[], &quorum_observations(&observed))
        .await
        .unwrap()
        .expect("deviated price expected");
    let report = decode_commit_report(&encoded).unwrap();

    assert!(report.gas_prices.is_empty());
    assert_eq!(report.token_prices.len(), 1);
    assert_eq!(report.token_prices[0].token, FEE_TOKEN);
    assert_eq!(report.token_prices[0].value, usd(4));
}

//! Full commit rounds: observation bytes through encoded reports,
//! acceptance, transmission, confirmation, and pipelining.

use super::*;
use lane_commit::domain::decode_commit_report;
use lane_commit::ports::inbound::ReportingPlugin;
use lane_commit::ports::outbound::synthetic_leaf;
use lane_commit::{verify_compute_root, CommitError, Keccak256Ctx, Tree};
use lane_types::ZERO_HASH;

#[tokio::test]
async fn test_full_round_commits_batch() {
    let lane = Lane::new();
    let node = lane.node();
    lane.publish_messages(1, 5);

    // Observation.
    let observed = parse_observation(&node.observation(round(1, 1), &[]).await.unwrap());
    assert_eq!(observed.interval, Interval::new(1, 5));

    // Report over the quorum's observations.
    let encoded = node
        .report(round(1, 1), &[], &quorum_observations(&observed))
        .await
        .unwrap()
        .expect("report expected");
    let report = decode_commit_report(&encoded).unwrap();
    assert_eq!(report.interval, Interval::new(1, 5));
    assert_ne!(report.merkle_root, ZERO_HASH);

    // Accept, then transmit.
    assert!(node
        .should_accept_finalized_report(round(1, 1), &encoded)
        .await
        .unwrap());
    assert!(node
        .should_transmit_accepted_report(round(1, 1), &encoded)
        .await
        .unwrap());

    // Once the chain confirms the range, re-transmission is stale.
    lane.confirm_through(5);
    assert!(!node
        .should_transmit_accepted_report(round(1, 1), &encoded)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_pipelines_batches_before_confirmation() {
    let lane = Lane::new();
    let node = lane.node();
    lane.publish_messages(1, 8);

    // First batch committed locally, chain not yet confirmed.
    let observed = parse_observation(&node.observation(round(1, 1), &[]).await.unwrap());
    assert_eq!(observed.interval, Interval::new(1, 8));
    let encoded = node
        .report(round(1, 1), &[], &quorum_observations(&observed))
        .await
        .unwrap()
        .expect("report expected");
    assert!(node
        .should_accept_finalized_report(round(1, 1), &encoded)
        .await
        .unwrap());

    // New messages arrive; the next observation builds on top of the
    // inflight batch without waiting for confirmation.
    lane.publish_messages(9, 12);
    let observed = parse_observation(&node.observation(round(1, 2), &[]).await.unwrap());
    assert_eq!(observed.interval, Interval::new(9, 12));

    let encoded_second = node
        .report(round(1, 2), &[], &quorum_observations(&observed))
        .await
        .unwrap()
        .expect("report expected");
    let second = decode_commit_report(&encoded_second).unwrap();
    assert_eq!(second.interval, Interval::new(9, 12));
    assert!(node
        .should_accept_finalized_report(round(1, 2), &encoded_second)
        .await
        .unwrap());

    // Both transmit while unconfirmed; both go stale after confirmation.
    assert!(node
        .should_transmit_accepted_report(round(1, 2), &encoded_second)
        .await
        .unwrap());
    lane.confirm_through(12);
    assert!(!node
        .should_transmit_accepted_report(round(1, 1), &encoded)
        .await
        .unwrap());
    assert!(!node
        .should_transmit_accepted_report(round(1, 2), &encoded_second)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_committed_root_matches_message_hashes() {
    let lane = Lane::new();
    let node = lane.node();
    lane.publish_messages(1, 6);

    let observed = parse_observation(&node.observation(round(1, 1), &[]).await.unwrap());
    let encoded = node
        .report(round(1, 1), &[], &quorum_observations(&observed))
        .await
        .unwrap()
        .expect("report expected");
    let report = decode_commit_report(&encoded).unwrap();

    // An executor holding the same message hashes can rebuild the tree and
    // prove any subset against the committed root.
    let leaves: Vec<_> = (1..=6).map(synthetic_leaf).collect();
    let tree = Tree::new(Keccak256Ctx, leaves.clone()).unwrap();
    assert_eq!(tree.root(), report.merkle_root);

    let indices = [0usize, 3, 5];
    let subset: Vec<_> = indices.iter().map(|&i| leaves[i]).collect();
    let proof = tree.prove(&indices).unwrap();
    assert_eq!(
        verify_compute_root(&Keccak256Ctx, &subset, &proof).unwrap(),
        report.merkle_root
    );
}

#[tokio::test]
async fn test_lagging_node_rejoins_via_accept() {
    let lane = Lane::new();
    let leader = lane.node();
    // A node that restarted and lost its inflight cache.
    let restarted = lane.node();
    lane.publish_messages(1, 4);

    let observed = parse_observation(&leader.observation(round(1, 1), &[]).await.unwrap());
    let encoded = leader
        .report(round(1, 1), &[], &quorum_observations(&observed))
        .await
        .unwrap()
        .expect("report expected");

    // Both nodes accept the finalized report; the restarted node's cache
    // catches up through acceptance.
    assert!(leader
        .should_accept_finalized_report(round(1, 1), &encoded)
        .await
        .unwrap());
    assert!(restarted
        .should_accept_finalized_report(round(1, 1), &encoded)
        .await
        .unwrap());
    assert_eq!(restarted.inflight_reports().max_inflight_seq_nr(), 4);

    // Its next observation builds past the accepted batch.
    lane.publish_messages(5, 6);
    let observed = parse_observation(&restarted.observation(round(1, 2), &[]).await.unwrap());
    assert_eq!(observed.interval, Interval::new(5, 6));
}

#[tokio::test]
async fn test_report_refuses_vanished_interval() {
    let lane = Lane::new();
    let node = lane.node();
    lane.publish_messages(1, 3);

    let observed = parse_observation(&node.observation(round(1, 1), &[]).await.unwrap());

    // The scanned messages vanish before the report phase re-fetches them
    // (reorg of a non-finalized reader); the round must fail, not emit an
    // empty-root report for a non-zero interval.
    lane.onramp.requests.lock().clear();
    let err = node
        .report(round(1, 1), &[], &quorum_observations(&observed))
        .await
        .unwrap_err();
    assert!(matches!(err, CommitError::TreeWithoutLeaves));
}

//! End-to-end tests for the sync engine against the instrumented gateway.

use std::sync::Arc;
use std::time::Duration;

use tally_gateway::GatewayError;
use tally_nullables::NullGateway;
use tally_sync::{SyncEngine, SyncError, SyncState};
use tally_types::{BallotCast, ElectionId, VoterAddress};

fn ballot(election_id: u64) -> BallotCast {
    BallotCast {
        election_id: ElectionId::new(election_id),
        voters: vec![
            VoterAddress::new("0x7F2FA234AEd9F7FA0D5070Fb325D1c2C983E96b1"),
            VoterAddress::new("0x154e80Ebc2e4769A1B680CAC800eE3A2613dC8D6"),
        ],
        weights: vec![2, 3],
    }
}

/// Wait until the engine has folded `expected` events in total.
async fn wait_for_folded(engine: &SyncEngine<NullGateway>, expected: u64) {
    for _ in 0..200 {
        if engine.stats().events_folded == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!(
        "timed out waiting for {expected} folded events, saw {}",
        engine.stats().events_folded
    );
}

/// Wait until the engine has discarded `expected` anomalous events.
async fn wait_for_anomalies(engine: &SyncEngine<NullGateway>, expected: u64) {
    for _ in 0..200 {
        if engine.stats().anomalies == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {expected} anomalies");
}

// ── Bootstrap ──────────────────────────────────────────────────────────

#[tokio::test]
async fn bootstrap_populates_store_with_zero_tallies() {
    let gateway = Arc::new(NullGateway::with_elections(&["Alpha", "Beta"]));
    let mut engine = SyncEngine::new(Arc::clone(&gateway));

    assert_eq!(engine.state(), SyncState::Idle);
    engine.bootstrap().await.unwrap();
    assert_eq!(engine.state(), SyncState::Live);

    let snapshot = engine.snapshot().await;
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].id, ElectionId::new(0));
    assert_eq!(snapshot[0].name, "Alpha");
    assert_eq!(snapshot[0].vote_count, 0);
    assert_eq!(snapshot[1].id, ElectionId::new(1));
    assert_eq!(snapshot[1].name, "Beta");
    assert_eq!(snapshot[1].vote_count, 0);
}

#[tokio::test]
async fn failed_bootstrap_commits_nothing() {
    let gateway = Arc::new(NullGateway::with_elections(&[
        "A", "B", "C", "D", "E",
    ]));
    gateway.fail_election_at(2);
    let mut engine = SyncEngine::new(Arc::clone(&gateway));

    let err = engine.bootstrap().await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::Gateway(GatewayError::IndexOutOfRange { index: 2 })
    ));

    assert_eq!(engine.state(), SyncState::BootstrapFailed);
    assert!(engine.snapshot().await.is_empty());
    assert_eq!(gateway.subscribe_count(), 0);
    assert_eq!(engine.stats().bootstrap_failures, 1);
}

#[tokio::test]
async fn unavailable_gateway_fails_bootstrap() {
    let gateway = Arc::new(NullGateway::with_elections(&["Alpha"]));
    gateway.set_unavailable(true);
    let mut engine = SyncEngine::new(Arc::clone(&gateway));

    let err = engine.bootstrap().await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::Gateway(GatewayError::Unavailable(_))
    ));
    assert_eq!(engine.state(), SyncState::BootstrapFailed);
    assert_eq!(gateway.subscribe_count(), 0);
}

// ── Event folding ──────────────────────────────────────────────────────

#[tokio::test]
async fn folded_events_increment_their_elections() {
    let gateway = Arc::new(NullGateway::with_elections(&["Alpha", "Beta"]));
    let mut engine = SyncEngine::new(Arc::clone(&gateway));
    engine.bootstrap().await.unwrap();

    gateway.emit(ballot(1)).await;
    gateway.emit(ballot(1)).await;
    gateway.emit(ballot(0)).await;
    wait_for_folded(&engine, 3).await;

    let snapshot = engine.snapshot().await;
    assert_eq!(snapshot[0].vote_count, 1);
    assert_eq!(snapshot[1].vote_count, 2);

    // Each event increments exactly one election by exactly one.
    let total: u64 = snapshot.iter().map(|e| e.vote_count).sum();
    assert_eq!(total, 3);
}

#[tokio::test]
async fn unknown_election_event_is_discarded_and_engine_stays_live() {
    let gateway = Arc::new(NullGateway::with_elections(&["Alpha", "Beta"]));
    let mut engine = SyncEngine::new(Arc::clone(&gateway));
    engine.bootstrap().await.unwrap();

    gateway.emit(ballot(9)).await;
    wait_for_anomalies(&engine, 1).await;

    let snapshot = engine.snapshot().await;
    assert!(snapshot.iter().all(|e| e.vote_count == 0));
    assert_eq!(engine.state(), SyncState::Live);

    // The loop keeps folding after the anomaly.
    gateway.emit(ballot(0)).await;
    wait_for_folded(&engine, 1).await;
    assert_eq!(engine.snapshot().await[0].vote_count, 1);
}

#[tokio::test]
async fn view_election_reads_one_entry() {
    let gateway = Arc::new(NullGateway::with_elections(&["Alpha", "Beta"]));
    let mut engine = SyncEngine::new(Arc::clone(&gateway));
    engine.bootstrap().await.unwrap();

    gateway.emit(ballot(1)).await;
    wait_for_folded(&engine, 1).await;

    let beta = engine.view_election(ElectionId::new(1)).await.unwrap();
    assert_eq!(beta.name, "Beta");
    assert_eq!(beta.vote_count, 1);
    assert!(engine.view_election(ElectionId::new(9)).await.is_none());
}

// ── Subscription lifecycle ─────────────────────────────────────────────

#[tokio::test]
async fn rebootstrap_keeps_exactly_one_subscription() {
    let gateway = Arc::new(NullGateway::with_elections(&["Alpha"]));
    let mut engine = SyncEngine::new(Arc::clone(&gateway));

    engine.bootstrap().await.unwrap();
    engine.bootstrap().await.unwrap();
    engine.bootstrap().await.unwrap();

    assert_eq!(gateway.subscribe_count(), 3);
    assert_eq!(gateway.unsubscribe_count(), 2);
    assert_eq!(gateway.active_subscriptions(), 1);

    // Exactly one listener: one emitted event folds exactly once.
    gateway.emit(ballot(0)).await;
    wait_for_folded(&engine, 1).await;
    assert_eq!(engine.snapshot().await[0].vote_count, 1);
}

#[tokio::test]
async fn rebootstrap_zeroes_previously_folded_tallies() {
    let gateway = Arc::new(NullGateway::with_elections(&["Alpha"]));
    let mut engine = SyncEngine::new(Arc::clone(&gateway));
    engine.bootstrap().await.unwrap();

    gateway.emit(ballot(0)).await;
    wait_for_folded(&engine, 1).await;
    assert_eq!(engine.snapshot().await[0].vote_count, 1);

    engine.bootstrap().await.unwrap();
    assert_eq!(engine.snapshot().await[0].vote_count, 0);
}

#[tokio::test]
async fn failed_rebootstrap_keeps_prior_subscription_and_store() {
    let gateway = Arc::new(NullGateway::with_elections(&["Alpha"]));
    let mut engine = SyncEngine::new(Arc::clone(&gateway));
    engine.bootstrap().await.unwrap();

    gateway.fail_election_at(0);
    assert!(engine.bootstrap().await.is_err());
    assert_eq!(engine.state(), SyncState::BootstrapFailed);

    // The earlier attachment and its store survive the failed attempt.
    assert_eq!(gateway.active_subscriptions(), 1);
    gateway.emit(ballot(0)).await;
    wait_for_folded(&engine, 1).await;
    assert_eq!(engine.snapshot().await[0].vote_count, 1);
}

#[tokio::test]
async fn shutdown_releases_the_subscription() {
    let gateway = Arc::new(NullGateway::with_elections(&["Alpha"]));
    let mut engine = SyncEngine::new(Arc::clone(&gateway));
    engine.bootstrap().await.unwrap();
    assert_eq!(gateway.active_subscriptions(), 1);

    engine.shutdown().await;
    assert_eq!(gateway.active_subscriptions(), 0);
    assert_eq!(engine.state(), SyncState::Idle);

    // Idempotent.
    engine.shutdown().await;
    assert_eq!(gateway.unsubscribe_count(), 1);
}

#[tokio::test]
async fn dropping_the_engine_releases_the_subscription() {
    let gateway = Arc::new(NullGateway::with_elections(&["Alpha"]));
    let mut engine = SyncEngine::new(Arc::clone(&gateway));
    engine.bootstrap().await.unwrap();

    drop(engine);

    // The abort backstop runs on the runtime; give it a beat.
    for _ in 0..200 {
        if gateway.active_subscriptions() == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("subscription not released after engine drop");
}

// ── Ballot submission ──────────────────────────────────────────────────

#[tokio::test]
async fn cast_ballot_forwards_without_touching_tallies() {
    let gateway = Arc::new(NullGateway::with_elections(&["Alpha", "Beta"]));
    let mut engine = SyncEngine::new(Arc::clone(&gateway));
    engine.bootstrap().await.unwrap();

    let voters = vec![
        VoterAddress::new("0x7F2FA234AEd9F7FA0D5070Fb325D1c2C983E96b1"),
        VoterAddress::new("0x154e80Ebc2e4769A1B680CAC800eE3A2613dC8D6"),
    ];
    let pending = engine
        .cast_ballot(ElectionId::new(0), &voters, &[2, 3])
        .await
        .unwrap();
    assert!(pending.tx_hash.starts_with("0x"));

    // No optimistic increment: the tally moves only when the event arrives.
    assert!(engine.snapshot().await.iter().all(|e| e.vote_count == 0));

    gateway.emit(ballot(0)).await;
    wait_for_folded(&engine, 1).await;
    assert_eq!(engine.snapshot().await[0].vote_count, 1);

    let submitted = gateway.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].weights, vec![2, 3]);
}

#[tokio::test]
async fn rejected_ballot_surfaces_and_mutates_nothing() {
    let gateway = Arc::new(NullGateway::with_elections(&["Alpha"]));
    let mut engine = SyncEngine::new(Arc::clone(&gateway));
    engine.bootstrap().await.unwrap();

    gateway.set_reject_submissions(true);
    let err = engine
        .cast_ballot(ElectionId::new(0), &[], &[])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SyncError::Gateway(GatewayError::RejectedByLedger(_))
    ));

    assert!(gateway.submitted().is_empty());
    assert!(engine.snapshot().await.iter().all(|e| e.vote_count == 0));
    assert_eq!(engine.state(), SyncState::Live);
}

// ── Stats ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn stats_track_engine_activity() {
    let gateway = Arc::new(NullGateway::with_elections(&["Alpha"]));
    let mut engine = SyncEngine::new(Arc::clone(&gateway));
    engine.bootstrap().await.unwrap();
    engine.bootstrap().await.unwrap();

    gateway.emit(ballot(0)).await;
    gateway.emit(ballot(7)).await;
    wait_for_folded(&engine, 1).await;
    wait_for_anomalies(&engine, 1).await;

    let stats = engine.stats();
    assert_eq!(stats.bootstraps, 2);
    assert_eq!(stats.bootstrap_failures, 0);
    assert_eq!(stats.events_folded, 1);
    assert_eq!(stats.anomalies, 1);
}

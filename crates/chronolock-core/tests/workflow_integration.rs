//! Integration tests for the lock/unlock workflow.
//!
//! These tests drive the public API end to end with a manual clock and an
//! in-memory price table, covering time gating, price gating, ordering of
//! failures and artifact handling.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use chronolock_core::{
    Comparator, Condition, ConditionSet, ConditionSetBuilder, LockError, LockMode, LockedArtifact,
    ManualClock, Note, OracleError, PriceOracle, StaticPriceOracle, Workflow,
};

const NOW: i64 = 1_760_000_000_000;

fn workflow(clock: &ManualClock, oracle: &StaticPriceOracle) -> Workflow {
    Workflow::new(Arc::new(clock.clone()), Arc::new(oracle.clone()))
}

/// Oracle that never answers in time.
struct StalledOracle;

#[async_trait]
impl PriceOracle for StalledOracle {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn get_price(&self, _symbol: &str) -> Result<f64, OracleError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(0.0)
    }
}

#[tokio::test]
async fn test_time_gating() {
    let clock = ManualClock::new(NOW);
    let wf = workflow(&clock, &StaticPriceOracle::new());
    let conditions = ConditionSetBuilder::new().time_lock(3).build(wf.clock()).unwrap();
    let artifact = wf.lock(&Note::from("hello"), &conditions).unwrap();

    let err = wf.unlock(&artifact).await.unwrap_err();
    assert!(matches!(
        err,
        LockError::ConditionNotMet {
            failing_condition: Condition::TimeLock { .. },
            ..
        }
    ));

    clock.advance(ChronoDuration::days(3));
    assert_eq!(wf.unlock(&artifact).await.unwrap(), Note::from("hello"));
}

#[tokio::test]
async fn test_price_gating() {
    let clock = ManualClock::new(NOW);
    let oracle = StaticPriceOracle::new().with_price("XAUUSD", 2300.0);
    let wf = workflow(&clock, &oracle);
    let conditions = ConditionSetBuilder::new()
        .price_lock_with("XAUUSD", 2400.0, Comparator::Gt)
        .build(wf.clock())
        .unwrap();
    let artifact = wf.lock(&Note::from("secret"), &conditions).unwrap();

    assert!(matches!(
        wf.unlock(&artifact).await,
        Err(LockError::ConditionNotMet { .. })
    ));

    oracle.set_price("XAUUSD", 2500.0);
    assert_eq!(wf.unlock(&artifact).await.unwrap().as_str(), "secret");
}

#[tokio::test]
async fn test_threshold_survives_artifact_exactly() {
    let threshold = 231100.97351436238;
    let clock = ManualClock::new(NOW);
    let oracle = StaticPriceOracle::new().with_price("XAUUSD", threshold);
    let wf = workflow(&clock, &oracle);
    let conditions = ConditionSetBuilder::new()
        .price_lock_with("XAUUSD", threshold, Comparator::Ge)
        .build(wf.clock())
        .unwrap();
    let artifact = wf.lock(&Note::from("A"), &conditions).unwrap();

    assert_eq!(wf.inspect(&artifact).unwrap().conditions, conditions);
    assert_eq!(wf.unlock(&artifact).await.unwrap().as_str(), "A");
}

#[tokio::test]
async fn test_empty_note_rejected() {
    let clock = ManualClock::new(NOW);
    let wf = workflow(&clock, &StaticPriceOracle::new());
    for text in ["", "   ", "\n\t"] {
        assert!(matches!(
            wf.lock(&Note::from(text), &ConditionSet::empty()),
            Err(LockError::EmptyNote)
        ));
    }
}

#[tokio::test]
async fn test_malformed_artifact() {
    let clock = ManualClock::new(NOW);
    let wf = workflow(&clock, &StaticPriceOracle::new());
    let err = wf
        .unlock(&LockedArtifact::from("not-a-valid-envelope"))
        .await
        .unwrap_err();
    assert!(matches!(err, LockError::MalformedArtifact(_)));
    assert!(wf.inspect(&LockedArtifact::from("")).is_err());
}

#[tokio::test]
async fn test_first_failure_is_reported_in_stored_order() {
    let clock = ManualClock::new(NOW);
    let oracle = StaticPriceOracle::new().with_price("XAUUSD", 2300.0);
    let wf = workflow(&clock, &oracle);
    let conditions = ConditionSetBuilder::new()
        .time_lock(1)
        .price_lock("XAUUSD", 2400.0)
        .build(wf.clock())
        .unwrap();
    let artifact = wf.lock(&Note::from("x"), &conditions).unwrap();

    let err = wf.unlock(&artifact).await.unwrap_err();
    assert_eq!(err.blocking_condition(), Some(&conditions.as_slice()[0]));

    // Once the time lock passes, the price lock is the blocker.
    clock.advance(ChronoDuration::days(1));
    let err = wf.unlock(&artifact).await.unwrap_err();
    assert_eq!(err.blocking_condition(), Some(&conditions.as_slice()[1]));
}

#[tokio::test]
async fn test_short_circuit_skips_later_lookups() {
    let clock = ManualClock::new(NOW);
    let wf = Workflow::new(Arc::new(clock.clone()), Arc::new(StalledOracle))
        .with_lookup_timeout(Duration::from_secs(10));
    let conditions = ConditionSetBuilder::new()
        .time_lock(1)
        .price_lock("XAUUSD", 2400.0)
        .build(wf.clock())
        .unwrap();
    let artifact = wf.lock(&Note::from("x"), &conditions).unwrap();

    // Would hang for the full timeout if the price lock were consulted.
    let err = tokio::time::timeout(Duration::from_secs(1), wf.unlock(&artifact))
        .await
        .expect("unlock should stop at the time lock")
        .unwrap_err();
    assert!(matches!(
        err.blocking_condition(),
        Some(Condition::TimeLock { .. })
    ));
}

#[tokio::test]
async fn test_idempotent_unlock() {
    let clock = ManualClock::new(NOW);
    let oracle = StaticPriceOracle::new().with_price("XAUUSD", 2500.0);
    let wf = workflow(&clock, &oracle);
    let conditions = ConditionSetBuilder::new()
        .price_lock("XAUUSD", 2400.0)
        .build(wf.clock())
        .unwrap();
    let artifact = wf.lock(&Note::from("twice"), &conditions).unwrap();
    let before = artifact.clone();

    let first = wf.unlock(&artifact).await.unwrap();
    let second = wf.unlock(&artifact).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(artifact, before);
}

#[tokio::test]
async fn test_lookup_timeout_blocks_unlock() {
    let clock = ManualClock::new(NOW);
    let wf = Workflow::new(Arc::new(clock.clone()), Arc::new(StalledOracle))
        .with_lookup_timeout(Duration::from_millis(20));
    let conditions = ConditionSetBuilder::new()
        .price_lock("XAUUSD", 2400.0)
        .build(wf.clock())
        .unwrap();
    let artifact = wf.lock(&Note::from("x"), &conditions).unwrap();

    let err = wf.unlock(&artifact).await.unwrap_err();
    assert!(matches!(
        err,
        LockError::ExternalLookupTimeout { timeout_ms: 20, .. }
    ));
    assert!(err.is_condition_unmet());
}

#[tokio::test]
async fn test_unknown_symbol_is_price_unavailable() {
    let clock = ManualClock::new(NOW);
    let wf = workflow(&clock, &StaticPriceOracle::new());
    let conditions = ConditionSetBuilder::new()
        .price_lock("BTCUSDT", 1.0)
        .build(wf.clock())
        .unwrap();
    let artifact = wf.lock(&Note::from("x"), &conditions).unwrap();

    match wf.unlock(&artifact).await.unwrap_err() {
        LockError::PriceUnavailable { symbol, .. } => assert_eq!(symbol, "BTCUSDT"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unlock_moment_is_fixed_when_conditions_are_built() {
    let clock = ManualClock::new(NOW);
    let wf = workflow(&clock, &StaticPriceOracle::new());
    let conditions = ConditionSetBuilder::new().time_lock(2).build(wf.clock()).unwrap();

    // A day passes between building the conditions and locking the note.
    clock.advance(ChronoDuration::days(1));
    let artifact = wf.lock(&Note::from("x"), &conditions).unwrap();

    clock.advance(ChronoDuration::days(1));
    assert!(wf.unlock(&artifact).await.is_ok());
}

#[tokio::test]
async fn test_artifact_from_one_workflow_opens_in_another() {
    let clock = ManualClock::new(NOW);
    let locker = workflow(&clock, &StaticPriceOracle::new()).with_mode(LockMode::Onchain);
    let artifact = locker
        .lock(&Note::from("portable"), &ConditionSet::empty())
        .unwrap();

    let opener = workflow(&ManualClock::new(NOW + 1), &StaticPriceOracle::new())
        .with_mode(LockMode::detect(artifact.as_str()));
    assert_eq!(opener.unlock(&artifact).await.unwrap().as_str(), "portable");
}

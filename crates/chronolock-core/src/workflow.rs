//! Lock/unlock workflow.
//!
//! `lock` seals a note and its conditions into a [`LockedArtifact`].
//! `unlock` opens an artifact and returns the note only if every condition
//! holds right now, evaluated in stored order and stopping at the first one
//! that does not.
//!
//! ## Usage
//!
//! ```ignore
//! let workflow = Workflow::new(Arc::new(SystemClock), Arc::new(oracle));
//! let conditions = ConditionSetBuilder::new().time_lock(3).build(workflow.clock())?;
//! let artifact = workflow.lock(&Note::from("hello"), &conditions)?;
//! // later
//! let note = workflow.unlock(&artifact).await?;
//! ```
//!
//! Neither operation mutates anything: an artifact can be unlocked any number
//! of times, and a failed call leaves nothing behind.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cipher::ArtifactCipher;
use crate::clock::Clock;
use crate::condition::{Condition, ConditionSet};
use crate::envelope::{ArtifactSummary, Envelope, LockMode, LockedArtifact, ENVELOPE_VERSION};
use crate::error::{LockError, Result, ValidationError};
use crate::note::Note;
use crate::oracle::PriceOracle;
use crate::positions::PositionSequence;

pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// An opened artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct UnlockedNote {
    pub note: Note,
    pub positions: Option<PositionSequence>,
    pub mode: LockMode,
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

pub struct Workflow {
    cipher: Box<dyn ArtifactCipher>,
    clock: Arc<dyn Clock>,
    oracle: Arc<dyn PriceOracle>,
    mode: LockMode,
    lookup_timeout: Duration,
}

impl Workflow {
    /// Offchain mode, base64 envelope, default lookup timeout.
    pub fn new(clock: Arc<dyn Clock>, oracle: Arc<dyn PriceOracle>) -> Self {
        Self {
            cipher: LockMode::Offchain.default_cipher(),
            clock,
            oracle,
            mode: LockMode::Offchain,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    /// Switch mode and the cipher that goes with it.
    pub fn with_mode(mut self, mode: LockMode) -> Self {
        self.mode = mode;
        self.cipher = mode.default_cipher();
        self
    }

    /// Replace the cipher without changing the recorded mode.
    pub fn with_cipher(mut self, cipher: Box<dyn ArtifactCipher>) -> Self {
        self.cipher = cipher;
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn cipher_name(&self) -> &str {
        self.cipher.name()
    }

    pub fn lookup_timeout(&self) -> Duration {
        self.lookup_timeout
    }

    // ── Lock ─────────────────────────────────────────────────────────

    pub fn lock(&self, note: &Note, conditions: &ConditionSet) -> Result<LockedArtifact> {
        self.lock_with(note, conditions, None)
    }

    /// Lock with a word-position sequence carried alongside the note.
    pub fn lock_with(
        &self,
        note: &Note,
        conditions: &ConditionSet,
        positions: Option<&PositionSequence>,
    ) -> Result<LockedArtifact> {
        self.seal(note, conditions, positions)
            .map(|(artifact, _)| artifact)
    }

    pub(crate) fn seal(
        &self,
        note: &Note,
        conditions: &ConditionSet,
        positions: Option<&PositionSequence>,
    ) -> Result<(LockedArtifact, Uuid)> {
        if note.is_blank() {
            return Err(LockError::EmptyNote);
        }
        // JSON has no encoding for NaN or infinity.
        for condition in conditions {
            if let Condition::PriceLock { threshold, .. } = condition {
                if !threshold.is_finite() {
                    return Err(ValidationError::new(
                        "threshold",
                        format!("must be a finite number, got {threshold}"),
                    )
                    .into());
                }
            }
        }

        let envelope = Envelope {
            version: ENVELOPE_VERSION,
            id: Uuid::new_v4(),
            mode: self.mode,
            note: note.as_str().to_owned(),
            conditions: conditions.clone(),
            created_at_ms: self.clock.now_ms(),
            positions: positions.cloned(),
        };
        let encoded = self.cipher.encode(&envelope.to_bytes()?)?;

        info!(
            artifact_id = %envelope.id,
            mode = %self.mode,
            cipher = self.cipher.name(),
            conditions = conditions.len(),
            "note locked"
        );
        Ok((LockedArtifact::from(encoded), envelope.id))
    }

    // ── Unlock ───────────────────────────────────────────────────────

    pub async fn unlock(&self, artifact: &LockedArtifact) -> Result<Note> {
        Ok(self.unlock_detailed(artifact).await?.note)
    }

    /// Like [`unlock`](Self::unlock), also returning the envelope metadata.
    pub async fn unlock_detailed(&self, artifact: &LockedArtifact) -> Result<UnlockedNote> {
        let envelope = self.open(artifact)?;

        for condition in &envelope.conditions {
            if let Err(e) = self.evaluate(condition).await {
                info!(artifact_id = %envelope.id, blocked_by = %condition, "unlock blocked");
                return Err(e);
            }
        }

        info!(artifact_id = %envelope.id, "note unlocked");
        let created_at = envelope.created_at();
        Ok(UnlockedNote {
            note: Note::from(envelope.note),
            positions: envelope.positions,
            mode: envelope.mode,
            id: envelope.id,
            created_at,
        })
    }

    /// Parse an artifact and describe it without evaluating its conditions.
    pub fn inspect(&self, artifact: &LockedArtifact) -> Result<ArtifactSummary> {
        Ok(self.open(artifact)?.summary())
    }

    fn open(&self, artifact: &LockedArtifact) -> Result<Envelope> {
        let bytes = self
            .cipher
            .decode(artifact.as_str())
            .map_err(|e| LockError::MalformedArtifact(e.to_string()))?;
        Envelope::from_bytes(&bytes)
    }

    // ── Conditions ───────────────────────────────────────────────────

    /// Check one condition against the current clock and oracle.
    pub async fn evaluate(&self, condition: &Condition) -> Result<()> {
        match condition {
            Condition::TimeLock { unlock_at_epoch_ms } => {
                let now_ms = self.clock.now_ms();
                debug!(now_ms, unlock_at_epoch_ms, "evaluating time lock");
                if now_ms >= *unlock_at_epoch_ms {
                    Ok(())
                } else {
                    Err(LockError::ConditionNotMet {
                        failing_condition: condition.clone(),
                        observed_price: None,
                    })
                }
            }
            Condition::PriceLock {
                symbol,
                threshold,
                comparator,
            } => {
                let observed = self.lookup_price(condition, symbol).await?;
                debug!(symbol = %symbol, observed, threshold, comparator = %comparator, "evaluating price lock");
                if comparator.compare(observed, *threshold) {
                    Ok(())
                } else {
                    Err(LockError::ConditionNotMet {
                        failing_condition: condition.clone(),
                        observed_price: Some(observed),
                    })
                }
            }
        }
    }

    async fn lookup_price(&self, condition: &Condition, symbol: &str) -> Result<f64> {
        let lookup = tokio::time::timeout(self.lookup_timeout, self.oracle.get_price(symbol)).await;
        match lookup {
            Err(_) => {
                warn!(
                    oracle = self.oracle.name(),
                    symbol,
                    timeout_ms = self.lookup_timeout.as_millis() as u64,
                    "price lookup timed out"
                );
                Err(LockError::ExternalLookupTimeout {
                    failing_condition: condition.clone(),
                    symbol: symbol.to_string(),
                    timeout_ms: self.lookup_timeout.as_millis() as u64,
                })
            }
            Ok(Err(e)) => {
                warn!(oracle = self.oracle.name(), symbol, error = %e, "price unavailable");
                Err(LockError::PriceUnavailable {
                    failing_condition: condition.clone(),
                    symbol: symbol.to_string(),
                    message: e.to_string(),
                })
            }
            Ok(Ok(price)) if !price.is_finite() => Err(LockError::PriceUnavailable {
                failing_condition: condition.clone(),
                symbol: symbol.to_string(),
                message: format!("non-finite price {price}"),
            }),
            Ok(Ok(price)) => Ok(price),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::{Base64Cipher, HmacCipher};
    use crate::clock::ManualClock;
    use crate::condition::{Comparator, ConditionSetBuilder, MS_PER_DAY};
    use crate::oracle::StaticPriceOracle;

    const NOW: i64 = 1_760_000_000_000;

    fn workflow(clock: &ManualClock, oracle: &StaticPriceOracle) -> Workflow {
        Workflow::new(Arc::new(clock.clone()), Arc::new(oracle.clone()))
    }

    #[tokio::test]
    async fn empty_set_unlocks_immediately() {
        let clock = ManualClock::new(NOW);
        let wf = workflow(&clock, &StaticPriceOracle::new());
        let artifact = wf.lock(&Note::from("hello"), &ConditionSet::empty()).unwrap();
        assert_eq!(wf.unlock(&artifact).await.unwrap(), Note::from("hello"));
    }

    #[tokio::test]
    async fn time_lock_boundary_is_inclusive() {
        let clock = ManualClock::new(NOW);
        let wf = workflow(&clock, &StaticPriceOracle::new());
        let conditions = ConditionSetBuilder::new().time_lock(1).build(wf.clock()).unwrap();
        let artifact = wf.lock(&Note::from("x"), &conditions).unwrap();

        clock.set_ms(NOW + MS_PER_DAY - 1);
        assert!(wf.unlock(&artifact).await.unwrap_err().is_condition_unmet());

        clock.set_ms(NOW + MS_PER_DAY);
        assert_eq!(wf.unlock(&artifact).await.unwrap().as_str(), "x");
    }

    #[tokio::test]
    async fn not_met_reports_observed_price() {
        let clock = ManualClock::new(NOW);
        let oracle = StaticPriceOracle::new().with_price("XAUUSD", 2300.0);
        let wf = workflow(&clock, &oracle);
        let conditions = ConditionSetBuilder::new()
            .price_lock_with("XAUUSD", 2400.0, Comparator::Ge)
            .build(wf.clock())
            .unwrap();
        let artifact = wf.lock(&Note::from("secret"), &conditions).unwrap();

        match wf.unlock(&artifact).await.unwrap_err() {
            LockError::ConditionNotMet { observed_price, .. } => {
                assert_eq!(observed_price, Some(2300.0));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn lock_rejects_non_finite_threshold() {
        let clock = ManualClock::new(NOW);
        let wf = workflow(&clock, &StaticPriceOracle::new().with_price("XAUUSD", 2500.0));
        for threshold in [f64::NEG_INFINITY, f64::INFINITY, f64::NAN] {
            let conditions = ConditionSet::new(vec![Condition::PriceLock {
                symbol: "XAUUSD".into(),
                threshold,
                comparator: Comparator::Gt,
            }]);
            match wf.lock(&Note::from("never sealed"), &conditions).unwrap_err() {
                LockError::Validation(e) => assert_eq!(e.field(), "threshold"),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn non_finite_price_is_unavailable() {
        let clock = ManualClock::new(NOW);
        let oracle = StaticPriceOracle::new().with_price("XAUUSD", f64::NAN);
        let wf = workflow(&clock, &oracle);
        let conditions = ConditionSetBuilder::new()
            .price_lock_with("XAUUSD", 2400.0, Comparator::Lt)
            .build(wf.clock())
            .unwrap();
        let artifact = wf.lock(&Note::from("secret"), &conditions).unwrap();
        assert!(matches!(
            wf.unlock(&artifact).await,
            Err(LockError::PriceUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn positions_travel_with_the_note() {
        let clock = ManualClock::new(NOW);
        let wf = workflow(&clock, &StaticPriceOracle::new());
        let positions = PositionSequence::shuffled_with_seed(12, Some(1)).unwrap();
        let artifact = wf
            .lock_with(&Note::from("seed words"), &ConditionSet::empty(), Some(&positions))
            .unwrap();

        let unlocked = wf.unlock_detailed(&artifact).await.unwrap();
        assert_eq!(unlocked.positions, Some(positions));
        assert_eq!(unlocked.mode, LockMode::Offchain);
        assert_eq!(unlocked.created_at.timestamp_millis(), NOW);
    }

    #[tokio::test]
    async fn inspect_does_not_evaluate() {
        let clock = ManualClock::new(NOW);
        let wf = workflow(&clock, &StaticPriceOracle::new());
        let conditions = ConditionSetBuilder::new()
            .time_lock(3)
            .price_lock("XAUUSD", 2400.0)
            .build(wf.clock())
            .unwrap();
        let artifact = wf.lock(&Note::from("x"), &conditions).unwrap();

        let summary = wf.inspect(&artifact).unwrap();
        assert_eq!(summary.conditions, conditions);
        assert!(!summary.has_positions);
    }

    #[tokio::test]
    async fn onchain_mode_uses_tagged_artifacts() {
        let clock = ManualClock::new(NOW);
        let onchain = workflow(&clock, &StaticPriceOracle::new()).with_mode(LockMode::Onchain);
        let artifact = onchain.lock(&Note::from("x"), &ConditionSet::empty()).unwrap();
        assert_eq!(LockMode::detect(artifact.as_str()), LockMode::Onchain);
        assert_eq!(onchain.unlock_detailed(&artifact).await.unwrap().mode, LockMode::Onchain);

        let offchain = workflow(&clock, &StaticPriceOracle::new());
        assert!(matches!(
            offchain.unlock(&artifact).await,
            Err(LockError::MalformedArtifact(_))
        ));
    }

    #[tokio::test]
    async fn tampered_hmac_artifact_is_malformed() {
        let clock = ManualClock::new(NOW);
        let wf = workflow(&clock, &StaticPriceOracle::new())
            .with_cipher(Box::new(HmacCipher::new("k").unwrap()));
        let artifact = wf.lock(&Note::from("x"), &ConditionSet::empty()).unwrap();
        assert_eq!(wf.cipher_name(), "hmac-sha256");

        let mut raw = artifact.into_string();
        raw.insert(0, 'A');
        assert!(matches!(
            wf.unlock(&LockedArtifact::from(raw)).await,
            Err(LockError::MalformedArtifact(_))
        ));
    }

    #[tokio::test]
    async fn valid_base64_of_non_envelope_is_malformed() {
        let clock = ManualClock::new(NOW);
        let wf = workflow(&clock, &StaticPriceOracle::new());
        let raw = Base64Cipher.encode(b"[1,2,3]").unwrap();
        assert!(matches!(
            wf.unlock(&LockedArtifact::from(raw)).await,
            Err(LockError::MalformedArtifact(_))
        ));
    }
}

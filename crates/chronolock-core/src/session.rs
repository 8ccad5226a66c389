//! Note session state machine.
//!
//! ```text
//! Unlocked(Note) --lock--> Locked(Artifact) --unlock--> Unlocked(Note)
//! ```
//!
//! The session starts unlocked with an empty note. It has no timers and no
//! background work; every transition is a caller command. A command that
//! fails leaves the state exactly as it was, and a command that does not
//! apply to the current state returns `Ok(None)`.

use crate::condition::ConditionSet;
use crate::envelope::LockedArtifact;
use crate::error::Result;
use crate::events::Event;
use crate::note::Note;
use crate::positions::PositionSequence;
use crate::workflow::Workflow;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Unlocked(Note),
    Locked(LockedArtifact),
}

pub struct NoteSession {
    workflow: Workflow,
    state: SessionState,
    positions: Option<PositionSequence>,
}

impl NoteSession {
    pub fn new(workflow: Workflow) -> Self {
        Self {
            workflow,
            state: SessionState::Unlocked(Note::default()),
            positions: None,
        }
    }

    /// Start from an artifact obtained elsewhere.
    pub fn from_artifact(workflow: Workflow, artifact: LockedArtifact) -> Self {
        Self {
            workflow,
            state: SessionState::Locked(artifact),
            positions: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.state, SessionState::Locked(_))
    }

    pub fn note(&self) -> Option<&Note> {
        match &self.state {
            SessionState::Unlocked(note) => Some(note),
            SessionState::Locked(_) => None,
        }
    }

    pub fn artifact(&self) -> Option<&LockedArtifact> {
        match &self.state {
            SessionState::Locked(artifact) => Some(artifact),
            SessionState::Unlocked(_) => None,
        }
    }

    pub fn positions(&self) -> Option<&PositionSequence> {
        self.positions.as_ref()
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Replace the note text. Ignored while locked.
    pub fn set_note(&mut self, note: impl Into<Note>) -> bool {
        match &mut self.state {
            SessionState::Unlocked(current) => {
                *current = note.into();
                true
            }
            SessionState::Locked(_) => false,
        }
    }

    /// Attach (or clear) the word positions sealed on the next lock.
    pub fn set_positions(&mut self, positions: Option<PositionSequence>) {
        self.positions = positions;
    }

    pub fn lock(&mut self, conditions: &ConditionSet) -> Result<Option<Event>> {
        let SessionState::Unlocked(note) = &self.state else {
            return Ok(None);
        };
        let (artifact, artifact_id) =
            self.workflow
                .seal(note, conditions, self.positions.as_ref())?;
        self.state = SessionState::Locked(artifact);
        Ok(Some(Event::NoteLocked {
            artifact_id,
            mode: self.workflow.mode(),
            conditions: conditions.len(),
            at: self.workflow.clock().now(),
        }))
    }

    pub async fn unlock(&mut self) -> Result<Option<Event>> {
        let SessionState::Locked(artifact) = &self.state else {
            return Ok(None);
        };
        let unlocked = self.workflow.unlock_detailed(artifact).await?;
        let event = Event::NoteUnlocked {
            artifact_id: unlocked.id,
            has_positions: unlocked.positions.is_some(),
            at: self.workflow.clock().now(),
        };
        self.state = SessionState::Unlocked(unlocked.note);
        if unlocked.positions.is_some() {
            self.positions = unlocked.positions;
        }
        Ok(Some(event))
    }

    pub fn reset(&mut self) -> Event {
        self.state = SessionState::Unlocked(Note::default());
        self.positions = None;
        Event::SessionReset {
            at: self.workflow.clock().now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::condition::ConditionSetBuilder;
    use crate::error::LockError;
    use crate::oracle::StaticPriceOracle;

    const NOW: i64 = 1_760_000_000_000;

    fn session(clock: &ManualClock) -> NoteSession {
        NoteSession::new(Workflow::new(
            Arc::new(clock.clone()),
            Arc::new(StaticPriceOracle::new()),
        ))
    }

    #[test]
    fn starts_unlocked_and_empty() {
        let clock = ManualClock::new(NOW);
        let session = session(&clock);
        assert_eq!(session.state(), &SessionState::Unlocked(Note::default()));
        assert!(!session.is_locked());
    }

    #[test]
    fn locking_empty_note_keeps_state() {
        let clock = ManualClock::new(NOW);
        let mut session = session(&clock);
        assert!(matches!(
            session.lock(&ConditionSet::empty()),
            Err(LockError::EmptyNote)
        ));
        assert!(!session.is_locked());
    }

    #[tokio::test]
    async fn full_cycle() {
        let clock = ManualClock::new(NOW);
        let mut session = session(&clock);
        assert!(session.set_note("hello"));

        let conditions = ConditionSetBuilder::new()
            .time_lock(3)
            .build(session.workflow().clock())
            .unwrap();
        let event = session.lock(&conditions).unwrap().unwrap();
        assert!(matches!(event, Event::NoteLocked { conditions: 1, .. }));
        assert!(session.is_locked());
        assert!(!session.set_note("edited while locked"));
        assert!(session.lock(&conditions).unwrap().is_none());

        let blocked = session.unlock().await.unwrap_err();
        assert!(blocked.is_condition_unmet());
        assert!(session.is_locked());

        clock.advance_ms(3 * crate::condition::MS_PER_DAY);
        let event = session.unlock().await.unwrap().unwrap();
        assert!(matches!(event, Event::NoteUnlocked { has_positions: false, .. }));
        assert_eq!(session.note(), Some(&Note::from("hello")));
        assert!(session.unlock().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unlock_restores_positions() {
        let clock = ManualClock::new(NOW);
        let mut session = session(&clock);
        let positions = PositionSequence::sequential(24).unwrap();
        session.set_note("words");
        session.set_positions(Some(positions.clone()));
        session.lock(&ConditionSet::empty()).unwrap();

        let artifact = session.artifact().unwrap().clone();
        let mut fresh = NoteSession::from_artifact(
            Workflow::new(Arc::new(clock.clone()), Arc::new(StaticPriceOracle::new())),
            artifact,
        );
        fresh.unlock().await.unwrap();
        assert_eq!(fresh.positions(), Some(&positions));
    }

    #[test]
    fn reset_clears_everything() {
        let clock = ManualClock::new(NOW);
        let mut session = session(&clock);
        session.set_note("x");
        session.set_positions(Some(PositionSequence::sequential(12).unwrap()));
        session.lock(&ConditionSet::empty()).unwrap();

        let event = session.reset();
        assert_eq!(event, Event::SessionReset { at: clock.now() });
        assert_eq!(session.note(), Some(&Note::default()));
        assert!(session.positions().is_none());
    }
}

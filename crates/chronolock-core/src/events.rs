use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::envelope::LockMode;

/// Every state change of a [`NoteSession`](crate::session::NoteSession)
/// produces an Event. Front ends render them; nothing in the core consumes
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    NoteLocked {
        artifact_id: Uuid,
        mode: LockMode,
        conditions: usize,
        at: DateTime<Utc>,
    },
    NoteUnlocked {
        artifact_id: Uuid,
        has_positions: bool,
        at: DateTime<Utc>,
    },
    /// Session cleared back to an empty unlocked note.
    SessionReset {
        at: DateTime<Utc>,
    },
}

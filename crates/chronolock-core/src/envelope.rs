//! The locked envelope and its opaque transport form.
//!
//! An [`Envelope`] is serialized to JSON, then handed to an
//! [`ArtifactCipher`](crate::cipher::ArtifactCipher). The resulting string is
//! the [`LockedArtifact`], the only representation that leaves the process.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cipher::{ArtifactCipher, Base64Cipher, TaggedCipher, LIT_PREFIX};
use crate::condition::ConditionSet;
use crate::error::{LockError, Result, ValidationError};
use crate::positions::PositionSequence;

/// Current envelope format. Anything else is rejected as malformed.
pub const ENVELOPE_VERSION: u32 = 1;

/// How a note is locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockMode {
    /// Local encoding only, no chain interaction.
    #[default]
    Offchain,
    /// Placeholder for chain-enforced access conditions.
    Onchain,
}

impl LockMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LockMode::Offchain => "offchain",
            LockMode::Onchain => "onchain",
        }
    }

    pub fn default_cipher(self) -> Box<dyn ArtifactCipher> {
        match self {
            LockMode::Offchain => Box::new(Base64Cipher),
            LockMode::Onchain => Box::new(TaggedCipher::lit()),
        }
    }

    /// Guess the mode an artifact string was produced in from its shape.
    pub fn detect(artifact: &str) -> Self {
        if artifact.trim_start().starts_with(LIT_PREFIX) {
            LockMode::Onchain
        } else {
            LockMode::Offchain
        }
    }
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LockMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "offchain" => Ok(LockMode::Offchain),
            "onchain" => Ok(LockMode::Onchain),
            other => Err(ValidationError::new(
                "mode",
                format!("expected 'offchain' or 'onchain', got '{other}'"),
            )),
        }
    }
}

/// Everything sealed inside an artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Envelope {
    pub version: u32,
    pub id: Uuid,
    pub mode: LockMode,
    pub note: String,
    pub conditions: ConditionSet,
    pub created_at_ms: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positions: Option<PositionSequence>,
}

impl Envelope {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let envelope: Envelope = serde_json::from_slice(bytes)
            .map_err(|e| LockError::MalformedArtifact(format!("invalid envelope: {e}")))?;
        if envelope.version != ENVELOPE_VERSION {
            return Err(LockError::MalformedArtifact(format!(
                "unsupported envelope version {}",
                envelope.version
            )));
        }
        Ok(envelope)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.created_at_ms).unwrap_or_default()
    }

    pub fn summary(&self) -> ArtifactSummary {
        ArtifactSummary {
            version: self.version,
            id: self.id,
            mode: self.mode,
            created_at: self.created_at(),
            conditions: self.conditions.clone(),
            has_positions: self.positions.is_some(),
        }
    }
}

/// Opaque, immutable transport string for a locked note.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockedArtifact(String);

impl LockedArtifact {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for LockedArtifact {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for LockedArtifact {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl AsRef<str> for LockedArtifact {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockedArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Envelope metadata, without the note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactSummary {
    pub version: u32,
    pub id: Uuid,
    pub mode: LockMode,
    pub created_at: DateTime<Utc>,
    pub conditions: ConditionSet,
    pub has_positions: bool,
}

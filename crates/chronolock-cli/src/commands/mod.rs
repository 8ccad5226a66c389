pub mod config;
pub mod inspect;
pub mod lock;
pub mod positions;
pub mod unlock;

use std::io::Read;

use chronolock_core::LockedArtifact;

/// Take an artifact from the command line, or from stdin when given `-`.
pub fn read_artifact(raw: &str) -> std::io::Result<LockedArtifact> {
    if raw == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(LockedArtifact::from(buf.trim()))
    } else {
        Ok(LockedArtifact::from(raw.trim()))
    }
}

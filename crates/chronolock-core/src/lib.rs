//! # ChronoLock Core Library
//!
//! This library provides the conditional-unlock note workflow behind
//! ChronoLock: a note is sealed together with a set of unlock conditions,
//! and can only be read back while every condition holds.
//!
//! ## Architecture
//!
//! - **Conditions**: time locks and price locks as a closed tagged enum,
//!   built from user-facing descriptors
//! - **Workflow**: lock/unlock over an injected clock and price oracle
//! - **Ciphers**: pluggable reversible encodings for the sealed envelope
//! - **Session**: a caller-driven locked/unlocked state machine that emits events
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`Workflow`]: Lock and unlock operations
//! - [`ConditionSetBuilder`]: Condition set construction
//! - [`ArtifactCipher`]: Envelope encoding seam
//! - [`PriceOracle`]: External price source
//! - [`WalletProvider`]: Wallet capability for onchain mode
//! - [`Config`]: Application configuration management

pub mod cipher;
pub mod clock;
pub mod condition;
pub mod envelope;
pub mod error;
pub mod events;
pub mod note;
pub mod oracle;
pub mod positions;
pub mod session;
pub mod storage;
pub mod wallet;
pub mod workflow;

pub use cipher::{ArtifactCipher, Base64Cipher, CipherError, HmacCipher, TaggedCipher};
pub use clock::{Clock, ManualClock, SystemClock};
pub use condition::{
    build_condition_set, Comparator, Condition, ConditionDescriptor, ConditionSet,
    ConditionSetBuilder,
};
pub use envelope::{ArtifactSummary, LockMode, LockedArtifact};
pub use error::{ConfigError, LockError, ValidationError};
pub use events::Event;
pub use note::Note;
pub use oracle::{HttpPriceOracle, OracleError, PriceOracle, StaticPriceOracle};
pub use positions::PositionSequence;
pub use session::{NoteSession, SessionState};
pub use storage::Config;
pub use wallet::{Address, StaticWalletProvider, WalletError, WalletProvider, WalletSession};
pub use workflow::{UnlockedNote, Workflow};

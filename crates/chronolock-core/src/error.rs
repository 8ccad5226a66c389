//! Core error types for chronolock-core.
//!
//! Every failure the lock/unlock workflow can produce is a typed value the
//! caller can present and retry. Nothing here is fatal to the host process.

use std::path::PathBuf;
use thiserror::Error;

use crate::cipher::CipherError;
use crate::condition::Condition;

/// Core error type for chronolock-core.
#[derive(Error, Debug)]
pub enum LockError {
    /// Note was empty or whitespace-only
    #[error("Note is empty")]
    EmptyNote,

    /// Artifact could not be parsed back into an envelope
    #[error("Malformed artifact: {0}")]
    MalformedArtifact(String),

    /// A condition evaluated false
    #[error("Condition not met: {failing_condition}")]
    ConditionNotMet {
        failing_condition: Condition,
        /// Price seen by the oracle, for price locks.
        observed_price: Option<f64>,
    },

    /// The oracle did not answer within the lookup timeout
    #[error("Price lookup for '{symbol}' timed out after {timeout_ms} ms")]
    ExternalLookupTimeout {
        failing_condition: Condition,
        symbol: String,
        timeout_ms: u64,
    },

    /// The oracle answered with an error or an unusable price
    #[error("Price unavailable for '{symbol}': {message}")]
    PriceUnavailable {
        failing_condition: Condition,
        symbol: String,
        message: String,
    },

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Artifact encoding errors on the lock path
    #[error("Cipher error: {0}")]
    Cipher(#[from] CipherError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Serialization errors on the lock path
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LockError {
    /// The condition that blocked an unlock, if this error is an unlock block.
    ///
    /// Timeouts and unavailable prices count as blocks: the condition could
    /// not be shown to hold.
    pub fn blocking_condition(&self) -> Option<&Condition> {
        match self {
            LockError::ConditionNotMet { failing_condition, .. }
            | LockError::ExternalLookupTimeout { failing_condition, .. }
            | LockError::PriceUnavailable { failing_condition, .. } => Some(failing_condition),
            _ => None,
        }
    }

    pub fn is_condition_unmet(&self) -> bool {
        self.blocking_condition().is_some()
    }
}

/// Validation error naming the offending field.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid value for '{field}': {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Result type alias for LockError
pub type Result<T, E = LockError> = std::result::Result<T, E>;

//! Wallet capability.
//!
//! The workflow never talks to a wallet. Callers that want onchain mode hold
//! a [`WalletSession`] over some [`WalletProvider`] and pass the resulting
//! [`LockMode`] to the workflow.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::envelope::LockMode;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WalletError {
    #[error("no wallet provider available")]
    NoProvider,

    #[error("wallet connection rejected: {0}")]
    Rejected(String),

    #[error("invalid wallet address '{0}'")]
    InvalidAddress(String),
}

/// An EVM-style account address: `0x` followed by 40 hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn parse(raw: &str) -> Result<Self, WalletError> {
        let raw = raw.trim();
        let valid = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()));
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(WalletError::InvalidAddress(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `0x1234...abcd`
    pub fn short(&self) -> String {
        format!("{}...{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = WalletError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

/// Something that can hand out the user's account address.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Request account access and return the first account.
    async fn connect(&self) -> Result<Address, WalletError>;
}

/// Provider with a fixed answer, for tests and headless use.
#[derive(Debug, Clone, Default)]
pub struct StaticWalletProvider {
    address: Option<Address>,
}

impl StaticWalletProvider {
    pub fn new(address: Address) -> Self {
        Self {
            address: Some(address),
        }
    }

    /// A provider that behaves as if no wallet were installed.
    pub fn missing() -> Self {
        Self { address: None }
    }
}

#[async_trait]
impl WalletProvider for StaticWalletProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn connect(&self) -> Result<Address, WalletError> {
        self.address.clone().ok_or(WalletError::NoProvider)
    }
}

/// Connection state plus the lock mode it implies.
///
/// Connecting switches to onchain mode; disconnecting falls back to offchain.
/// A failed connect leaves both untouched.
pub struct WalletSession<P: WalletProvider> {
    provider: P,
    address: Option<Address>,
    mode: LockMode,
}

impl<P: WalletProvider> WalletSession<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            address: None,
            mode: LockMode::Offchain,
        }
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: LockMode) {
        self.mode = mode;
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    pub async fn connect(&mut self) -> Result<&Address, WalletError> {
        match self.provider.connect().await {
            Ok(address) => {
                info!(provider = self.provider.name(), address = %address.short(), "wallet connected");
                self.mode = LockMode::Onchain;
                Ok(&*self.address.insert(address))
            }
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "wallet connection failed");
                Err(e)
            }
        }
    }

    pub fn disconnect(&mut self) {
        self.address = None;
        self.mode = LockMode::Offchain;
    }
}

//! Price oracles.
//!
//! The workflow only consumes prices; where they come from is up to the
//! [`PriceOracle`] it was given. Retry policy, if any, belongs here and not
//! in the workflow.

mod http;
mod static_oracle;

pub use http::{HttpPriceOracle, DEFAULT_BASE_URL};
pub use static_oracle::StaticPriceOracle;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OracleError {
    #[error("no price for symbol '{0}'")]
    UnknownSymbol(String),

    #[error("invalid price source url: {0}")]
    InvalidUrl(String),

    #[error("price request failed: {0}")]
    Request(String),

    #[error("price source returned HTTP {status}")]
    Status { status: u16 },

    #[error("unparsable price response: {0}")]
    InvalidResponse(String),
}

/// External source of current prices.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Identifier used in logs (e.g. "static", "http").
    fn name(&self) -> &str;

    async fn get_price(&self, symbol: &str) -> Result<f64, OracleError>;
}

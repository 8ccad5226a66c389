use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::{OracleError, PriceOracle};

/// In-memory price table. Clones share the same table, so a test can hold
/// one handle and move prices while a workflow owns another.
#[derive(Debug, Clone, Default)]
pub struct StaticPriceOracle {
    prices: Arc<RwLock<HashMap<String, f64>>>,
}

impl StaticPriceOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(self, symbol: impl Into<String>, price: f64) -> Self {
        self.set_price(symbol, price);
        self
    }

    pub fn set_price(&self, symbol: impl Into<String>, price: f64) {
        let mut prices = self
            .prices
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        prices.insert(symbol.into(), price);
    }

    pub fn remove_price(&self, symbol: &str) {
        let mut prices = self
            .prices
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        prices.remove(symbol);
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for StaticPriceOracle {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let oracle = Self::new();
        for (symbol, price) in iter {
            oracle.set_price(symbol, price);
        }
        oracle
    }
}

#[async_trait]
impl PriceOracle for StaticPriceOracle {
    fn name(&self) -> &str {
        "static"
    }

    async fn get_price(&self, symbol: &str) -> Result<f64, OracleError> {
        let prices = self
            .prices
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        prices
            .get(symbol)
            .copied()
            .ok_or_else(|| OracleError::UnknownSymbol(symbol.to_string()))
    }
}

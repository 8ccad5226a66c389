//! Ticker-endpoint price oracle.
//!
//! Queries `GET {base_url}/api/v3/ticker/price?symbol=XAUUSD` and expects a
//! body like `{"symbol":"XAUUSD","price":"2412.50"}`. The price may arrive as
//! a string or a number.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::{OracleError, PriceOracle};

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";
const TICKER_PATH: &str = "api/v3/ticker/price";

#[derive(Debug, Deserialize)]
struct TickerResponse {
    price: PriceField,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PriceField {
    Number(f64),
    Text(String),
}

impl PriceField {
    fn value(&self) -> Result<f64, OracleError> {
        let value = match self {
            PriceField::Number(n) => *n,
            PriceField::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| OracleError::InvalidResponse(format!("price '{s}': {e}")))?,
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(OracleError::InvalidResponse(format!("non-finite price {value}")))
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpPriceOracle {
    client: Client,
    endpoint: Url,
}

impl HttpPriceOracle {
    pub fn new(base_url: &str) -> Result<Self, OracleError> {
        let mut base =
            Url::parse(base_url).map_err(|e| OracleError::InvalidUrl(format!("{base_url}: {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join(TICKER_PATH)
            .map_err(|e| OracleError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            client: Client::new(),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl PriceOracle for HttpPriceOracle {
    fn name(&self) -> &str {
        "http"
    }

    async fn get_price(&self, symbol: &str) -> Result<f64, OracleError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("symbol", symbol)])
            .send()
            .await
            .map_err(|e| OracleError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Status {
                status: status.as_u16(),
            });
        }

        let ticker: TickerResponse = response
            .json()
            .await
            .map_err(|e| OracleError::InvalidResponse(e.to_string()))?;
        ticker.price.value()
    }
}

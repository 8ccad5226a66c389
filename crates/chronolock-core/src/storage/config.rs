//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Default lock mode and price lookup timeout
//! - Price source (HTTP ticker endpoint or a static price table)
//! - Default seed-phrase word count
//! - Optional integrity key for offchain artifacts
//!
//! Configuration is stored at `~/.config/chronolock/config.toml`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::cipher::{ArtifactCipher, CipherError, HmacCipher};
use crate::clock::Clock;
use crate::condition::Comparator;
use crate::envelope::LockMode;
use crate::error::{ConfigError, LockError};
use crate::oracle::{HttpPriceOracle, OracleError, PriceOracle, StaticPriceOracle, DEFAULT_BASE_URL};
use crate::positions::SUPPORTED_WORD_COUNTS;
use crate::workflow::Workflow;

/// Lock defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    #[serde(default)]
    pub mode: LockMode,
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
    #[serde(default)]
    pub default_comparator: Comparator,
}

/// Price source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Fixed prices. When non-empty these are used instead of the HTTP source.
    #[serde(default)]
    pub prices: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionsConfig {
    #[serde(default = "default_word_count")]
    pub word_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrityConfig {
    /// When set, offchain artifacts carry an HMAC-SHA256 tag under this key.
    #[serde(default)]
    pub hmac_key: Option<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/chronolock/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub lock: LockConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub positions: PositionsConfig,
    #[serde(default)]
    pub integrity: IntegrityConfig,
}

// Default functions
fn default_lookup_timeout_ms() -> u64 {
    5_000
}
fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_word_count() -> usize {
    12
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            mode: LockMode::Offchain,
            lookup_timeout_ms: default_lookup_timeout_ms(),
            default_comparator: Comparator::Gt,
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            prices: BTreeMap::new(),
        }
    }
}

impl Default for PositionsConfig {
    fn default() -> Self {
        Self {
            word_count: default_word_count(),
        }
    }
}

/// JSON pointer for a dot-separated config key such as `lock.mode`.
fn json_pointer(key: &str) -> Option<String> {
    let malformed = key
        .split('.')
        .any(|part| part.is_empty() || part.contains(['/', '~']));
    if malformed {
        return None;
    }
    Some(format!("/{}", key.replace('.', "/")))
}

/// Parse `raw` into the JSON type already stored at the key.
fn coerce(existing: &serde_json::Value, raw: &str) -> Result<serde_json::Value, String> {
    use serde_json::Value;

    match existing {
        Value::Bool(_) => raw.parse::<bool>().map(Value::Bool).map_err(|e| e.to_string()),
        Value::Number(_) => raw
            .parse::<u64>()
            .map(Value::from)
            .or_else(|_| {
                raw.parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .ok_or(())
            })
            .map_err(|()| format!("cannot parse '{raw}' as number")),
        Value::Object(_) | Value::Array(_) => serde_json::from_str(raw).map_err(|e| e.to_string()),
        _ => Ok(Value::String(raw.into())),
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = json.pointer(&json_pointer(key)?)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key in memory, keeping the existing type.
    ///
    /// An empty `integrity.hmac_key` clears the key.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        let slot = json_pointer(key)
            .and_then(|pointer| json.pointer_mut(&pointer))
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        *slot = coerce(slot, value).map_err(invalid)?;

        let mut updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.integrity.hmac_key = updated.integrity.hmac_key.filter(|k| !k.is_empty());
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a value by key and persist. Returns error if key is unknown.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.set_value(key, value)?;
        self.save()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !SUPPORTED_WORD_COUNTS.contains(&self.positions.word_count) {
            return Err(ConfigError::InvalidValue {
                key: "positions.word_count".into(),
                message: format!("must be 12 or 24, got {}", self.positions.word_count),
            });
        }
        if self.integrity.hmac_key.as_deref() == Some("") {
            return Err(ConfigError::InvalidValue {
                key: "integrity.hmac_key".into(),
                message: "must not be empty; remove the key to disable signing".into(),
            });
        }
        if self.lock.lookup_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "lock.lookup_timeout_ms".into(),
                message: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lock.lookup_timeout_ms)
    }

    /// Cipher for artifacts in `mode`. The integrity key only applies offchain.
    pub fn cipher(&self, mode: LockMode) -> Result<Box<dyn ArtifactCipher>, CipherError> {
        match (mode, self.integrity.hmac_key.as_deref()) {
            (LockMode::Offchain, Some(key)) => Ok(Box::new(HmacCipher::new(key)?)),
            _ => Ok(mode.default_cipher()),
        }
    }

    /// Static table when prices are configured, otherwise the HTTP source.
    pub fn price_oracle(&self) -> Result<Arc<dyn PriceOracle>, OracleError> {
        if self.oracle.prices.is_empty() {
            Ok(Arc::new(HttpPriceOracle::new(&self.oracle.base_url)?))
        } else {
            let oracle: StaticPriceOracle = self
                .oracle
                .prices
                .iter()
                .map(|(symbol, price)| (symbol.clone(), *price))
                .collect();
            Ok(Arc::new(oracle))
        }
    }

    /// Assemble a workflow for `mode` from these settings.
    pub fn workflow(
        &self,
        mode: LockMode,
        clock: Arc<dyn Clock>,
        oracle: Arc<dyn PriceOracle>,
    ) -> Result<Workflow, LockError> {
        Ok(Workflow::new(clock, oracle)
            .with_mode(mode)
            .with_cipher(self.cipher(mode)?)
            .with_lookup_timeout(self.lookup_timeout()))
    }
}

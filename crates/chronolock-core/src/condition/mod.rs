//! Unlock conditions.
//!
//! A [`Condition`] is a closed set of predicates; evaluation dispatches on the
//! variant, so a condition of an unknown shape can never reach the workflow.

mod builder;

pub use builder::{build_condition_set, ConditionDescriptor, ConditionSetBuilder, MS_PER_DAY};

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Comparison applied between an observed price and a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Comparator {
    #[default]
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
}

impl Comparator {
    pub fn symbol(self) -> &'static str {
        match self {
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
            Comparator::Lt => "<",
            Comparator::Le => "<=",
        }
    }

    /// `observed <self> threshold`
    pub fn compare(self, observed: f64, threshold: f64) -> bool {
        match self {
            Comparator::Gt => observed > threshold,
            Comparator::Ge => observed >= threshold,
            Comparator::Lt => observed < threshold,
            Comparator::Le => observed <= threshold,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Comparator {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            ">" => Ok(Comparator::Gt),
            ">=" => Ok(Comparator::Ge),
            "<" => Ok(Comparator::Lt),
            "<=" => Ok(Comparator::Le),
            other => Err(ValidationError::new(
                "comparator",
                format!("expected one of >, >=, <, <= but got '{other}'"),
            )),
        }
    }
}

/// A single unlock predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// Satisfied once the clock reaches `unlock_at_epoch_ms`.
    TimeLock { unlock_at_epoch_ms: i64 },
    /// Satisfied while `price(symbol) <comparator> threshold`.
    PriceLock {
        symbol: String,
        threshold: f64,
        comparator: Comparator,
    },
}

impl Condition {
    pub fn kind(&self) -> &'static str {
        match self {
            Condition::TimeLock { .. } => "time_lock",
            Condition::PriceLock { .. } => "price_lock",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::TimeLock { unlock_at_epoch_ms } => {
                match DateTime::from_timestamp_millis(*unlock_at_epoch_ms) {
                    Some(at) => write!(
                        f,
                        "time lock until {}",
                        at.to_rfc3339_opts(SecondsFormat::Secs, true)
                    ),
                    None => write!(f, "time lock until epoch ms {unlock_at_epoch_ms}"),
                }
            }
            Condition::PriceLock {
                symbol,
                threshold,
                comparator,
            } => write!(f, "price lock {symbol} {comparator} {threshold}"),
        }
    }
}

/// Ordered conditions attached to one note. Empty means always unlockable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionSet(Vec<Condition>);

impl ConditionSet {
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self(conditions)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Condition> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Condition] {
        &self.0
    }
}

impl From<Vec<Condition>> for ConditionSet {
    fn from(conditions: Vec<Condition>) -> Self {
        Self(conditions)
    }
}

impl<'a> IntoIterator for &'a ConditionSet {
    type Item = &'a Condition;
    type IntoIter = std::slice::Iter<'a, Condition>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

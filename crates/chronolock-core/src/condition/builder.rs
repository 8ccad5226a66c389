//! Condition set construction from user-facing descriptors.
//!
//! Time locks are given as a day offset and resolved to an absolute epoch
//! against the clock when the set is built, not when the note is locked.

use serde::{Deserialize, Serialize};

use super::{Comparator, Condition, ConditionSet};
use crate::clock::Clock;
use crate::error::ValidationError;

pub const MS_PER_DAY: i64 = 86_400_000;

/// An enabled condition as entered by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionDescriptor {
    TimeLock {
        offset_days: i64,
    },
    PriceLock {
        symbol: String,
        threshold: f64,
        /// Defaults to `>` when absent.
        #[serde(default)]
        comparator: Option<Comparator>,
    },
}

impl ConditionDescriptor {
    fn resolve(&self, now_ms: i64) -> Result<Condition, ValidationError> {
        match self {
            ConditionDescriptor::TimeLock { offset_days } => {
                if *offset_days <= 0 {
                    return Err(ValidationError::new(
                        "offset_days",
                        format!("must be greater than zero, got {offset_days}"),
                    ));
                }
                let unlock_at_epoch_ms = offset_days
                    .checked_mul(MS_PER_DAY)
                    .and_then(|offset| now_ms.checked_add(offset))
                    .ok_or_else(|| {
                        ValidationError::new("offset_days", format!("{offset_days} days is out of range"))
                    })?;
                Ok(Condition::TimeLock { unlock_at_epoch_ms })
            }
            ConditionDescriptor::PriceLock {
                symbol,
                threshold,
                comparator,
            } => {
                let symbol = symbol.trim();
                if symbol.is_empty() {
                    return Err(ValidationError::new("symbol", "must not be empty"));
                }
                if !threshold.is_finite() {
                    return Err(ValidationError::new(
                        "threshold",
                        format!("must be a finite number, got {threshold}"),
                    ));
                }
                Ok(Condition::PriceLock {
                    symbol: symbol.to_string(),
                    threshold: *threshold,
                    comparator: comparator.unwrap_or_default(),
                })
            }
        }
    }
}

/// Resolve descriptors into a [`ConditionSet`], preserving their order.
///
/// The clock is read once so every time lock in the set shares the same base.
pub fn build_condition_set(
    descriptors: &[ConditionDescriptor],
    clock: &dyn Clock,
) -> Result<ConditionSet, ValidationError> {
    let now_ms = clock.now_ms();
    descriptors
        .iter()
        .map(|descriptor| descriptor.resolve(now_ms))
        .collect::<Result<Vec<_>, _>>()
        .map(ConditionSet::from)
}

/// Fluent collector for descriptors.
///
/// ```ignore
/// let set = ConditionSetBuilder::new()
///     .time_lock(3)
///     .price_lock("XAUUSD", 2400.0)
///     .build(&SystemClock)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConditionSetBuilder {
    descriptors: Vec<ConditionDescriptor>,
}

impl ConditionSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time_lock(mut self, offset_days: i64) -> Self {
        self.descriptors
            .push(ConditionDescriptor::TimeLock { offset_days });
        self
    }

    pub fn price_lock(mut self, symbol: impl Into<String>, threshold: f64) -> Self {
        self.descriptors.push(ConditionDescriptor::PriceLock {
            symbol: symbol.into(),
            threshold,
            comparator: None,
        });
        self
    }

    pub fn price_lock_with(
        mut self,
        symbol: impl Into<String>,
        threshold: f64,
        comparator: Comparator,
    ) -> Self {
        self.descriptors.push(ConditionDescriptor::PriceLock {
            symbol: symbol.into(),
            threshold,
            comparator: Some(comparator),
        });
        self
    }

    pub fn push(mut self, descriptor: ConditionDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    pub fn descriptors(&self) -> &[ConditionDescriptor] {
        &self.descriptors
    }

    pub fn build(&self, clock: &dyn Clock) -> Result<ConditionSet, ValidationError> {
        build_condition_set(&self.descriptors, clock)
    }
}

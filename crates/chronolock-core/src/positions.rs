//! Seed-phrase word positions.
//!
//! A position sequence records the order in which the words of a 12 or 24
//! word phrase were written down. It is always a permutation of `1..=n`.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const SUPPORTED_WORD_COUNTS: [usize; 2] = [12, 24];

/// Number of leading positions shown by [`PositionSequence::preview`].
const PREVIEW_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct PositionSequence {
    positions: Vec<u8>,
}

fn check_word_count(word_count: usize) -> Result<(), ValidationError> {
    if SUPPORTED_WORD_COUNTS.contains(&word_count) {
        Ok(())
    } else {
        Err(ValidationError::new(
            "word_count",
            format!("must be 12 or 24, got {word_count}"),
        ))
    }
}

impl PositionSequence {
    /// `1, 2, ..., word_count`
    pub fn sequential(word_count: usize) -> Result<Self, ValidationError> {
        check_word_count(word_count)?;
        Ok(Self {
            positions: (1..=word_count as u8).collect(),
        })
    }

    /// Uniform random permutation of `1..=word_count`.
    pub fn shuffled<R: Rng + ?Sized>(
        word_count: usize,
        rng: &mut R,
    ) -> Result<Self, ValidationError> {
        let mut sequence = Self::sequential(word_count)?;
        sequence.positions.shuffle(rng);
        Ok(sequence)
    }

    /// Shuffle with a reproducible generator when `seed` is given.
    pub fn shuffled_with_seed(
        word_count: usize,
        seed: Option<u64>,
    ) -> Result<Self, ValidationError> {
        let mut rng = match seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        Self::shuffled(word_count, &mut rng)
    }

    pub fn word_count(&self) -> usize {
        self.positions.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.positions
    }

    pub fn is_sequential(&self) -> bool {
        self.positions
            .iter()
            .enumerate()
            .all(|(i, &p)| p as usize == i + 1)
    }

    /// First few positions, e.g. `"3, 11, 7, 1, 9, 12..."`.
    pub fn preview(&self) -> String {
        let head: Vec<String> = self
            .positions
            .iter()
            .take(PREVIEW_LEN)
            .map(u8::to_string)
            .collect();
        format!("{}...", head.join(", "))
    }
}

impl std::fmt::Display for PositionSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let all: Vec<String> = self.positions.iter().map(u8::to_string).collect();
        f.write_str(&all.join(", "))
    }
}

impl TryFrom<Vec<u8>> for PositionSequence {
    type Error = ValidationError;

    fn try_from(positions: Vec<u8>) -> Result<Self, Self::Error> {
        let n = positions.len();
        check_word_count(n)?;
        let mut seen = vec![false; n];
        for &p in &positions {
            let slot = (p as usize)
                .checked_sub(1)
                .filter(|&i| i < n)
                .ok_or_else(|| {
                    ValidationError::new("positions", format!("position {p} outside 1..={n}"))
                })?;
            if std::mem::replace(&mut seen[slot], true) {
                return Err(ValidationError::new(
                    "positions",
                    format!("position {p} appears more than once"),
                ));
            }
        }
        Ok(Self { positions })
    }
}

impl From<PositionSequence> for Vec<u8> {
    fn from(sequence: PositionSequence) -> Self {
        sequence.positions
    }
}

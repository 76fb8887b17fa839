// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::enums::SketchKind;
use crate::sketches::hash64;
use crate::traits::{Mergeable, Sketch, SketchError};
use serde::{Deserialize, Serialize};
use std::hash::Hash;

pub const MIN_PRECISION: u8 = 4;
pub const MAX_PRECISION: u8 = 16;
pub const DEFAULT_PRECISION: u8 = 14;

/// 2^64, the size of the hash space.
const HASH_SPACE: f64 = 18_446_744_073_709_551_616.0;

/// Construction parameters for [`HyperLogLog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HyperLogLogConfig {
    /// Number of index bits; the sketch holds `2^precision` registers.
    pub precision: u8,
    /// Hash key. Sketches built with different seeds cannot be merged.
    #[serde(default)]
    pub seed: u64,
}

impl Default for HyperLogLogConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            seed: 0,
        }
    }
}

impl HyperLogLogConfig {
    pub fn new(precision: u8) -> Result<Self, SketchError> {
        let config = Self { precision, seed: 0 };
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), SketchError> {
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&self.precision) {
            return Err(SketchError::InvalidParameter(format!(
                "HyperLogLog precision must be in [{}, {}], got {}",
                MIN_PRECISION, MAX_PRECISION, self.precision
            )));
        }
        Ok(())
    }

    pub fn num_registers(&self) -> usize {
        1 << self.precision
    }
}

/// HyperLogLog - Cardinality Estimation Sketch
///
/// A probabilistic data structure for estimating the number of unique elements (cardinality)
/// in a multiset. It uses significantly less memory than storing the elements themselves.
///
/// # Key Properties
///
/// - **Fixed Memory**: `2^p` one-byte registers regardless of the number of elements.
/// - **Accuracy**: Standard error is approximately `1.04 / sqrt(2^p)` (0.81% at p=14).
/// - **Mergeable**: Merged by taking the element-wise maximum of the registers, which is exact
///   union semantics; error does not compound across merges.
/// - **Idempotent**: Adding the same element multiple times does not change the estimate.
///
/// # Example
///
/// ```
/// use stream_sketches::{HyperLogLog, HyperLogLogConfig, Mergeable};
///
/// let mut hll = HyperLogLog::zero(&HyperLogLogConfig::default()).unwrap();
/// hll.add("user1");
/// hll.add("user2");
/// hll.add("user3");
/// hll.add("user1"); // Duplicate
///
/// let count = hll.cardinality();
/// assert!(count >= 2 && count <= 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HyperLogLog {
    precision: u8,
    seed: u64,
    /// `2^precision` registers, each the max observed leading-zero run + 1.
    registers: Vec<u8>,
}

impl HyperLogLog {
    pub fn new(config: HyperLogLogConfig) -> Result<Self, SketchError> {
        config.validate()?;
        Ok(Self {
            precision: config.precision,
            seed: config.seed,
            registers: vec![0u8; config.num_registers()],
        })
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    pub fn registers(&self) -> &[u8] {
        &self.registers
    }

    /// Largest value a register can hold: the suffix width plus one.
    fn max_rank(&self) -> u8 {
        64 - self.precision + 1
    }

    /// Add an element to the HyperLogLog.
    ///
    /// Returns `true` if the internal state changed.
    pub fn add<T: Hash + ?Sized>(&mut self, item: &T) -> bool {
        let hash = hash64(self.seed, item);
        let p = u32::from(self.precision);

        // Top p bits select the register, the rest feed the rank.
        let index = (hash >> (64 - p)) as usize;
        let suffix = hash << p;
        let rank = ((suffix.leading_zeros() + 1) as u8).min(self.max_rank());

        let register = &mut self.registers[index];
        if rank > *register {
            *register = rank;
            true
        } else {
            false
        }
    }

    fn alpha(m: f64) -> f64 {
        match m as usize {
            16 => 0.673,
            32 => 0.697,
            64 => 0.709,
            _ => 0.7213 / (1.0 + 1.079 / m),
        }
    }

    /// Estimate the cardinality as a float, with small- and large-range corrections.
    ///
    /// Never exceeds the 64-bit hash space; a sketch with saturated registers reports `2^64`.
    pub fn estimate(&self) -> f64 {
        let m = self.registers.len() as f64;
        let mut sum = 0.0;
        let mut zeros = 0usize;

        for &register in &self.registers {
            if register == 0 {
                zeros += 1;
            }
            sum += 2f64.powi(-i32::from(register));
        }

        let raw = Self::alpha(m) * m * m / sum;

        if raw <= 2.5 * m {
            // Small range correction (LinearCounting)
            if zeros > 0 {
                return m * (m / zeros as f64).ln();
            }
            raw
        } else if raw >= HASH_SPACE {
            // Saturated registers: every hash value is accounted for.
            HASH_SPACE
        } else if raw > HASH_SPACE / 30.0 {
            -HASH_SPACE * (1.0 - raw / HASH_SPACE).ln()
        } else {
            raw
        }
    }

    /// Estimate the cardinality (number of unique elements), rounded. Saturates at `u64::MAX`.
    pub fn cardinality(&self) -> u64 {
        self.estimate().round() as u64
    }

    /// Expected relative standard error, `1.04 / sqrt(m)`.
    pub fn standard_error(&self) -> f64 {
        1.04 / (self.registers.len() as f64).sqrt()
    }

    fn check_compatible(&self, other: &Self) -> Result<(), SketchError> {
        if self.precision != other.precision {
            tracing::warn!(
                left = self.precision,
                right = other.precision,
                "rejected HyperLogLog merge with mismatched precision"
            );
            return Err(SketchError::ParameterMismatch(format!(
                "HyperLogLog precision {} vs {}",
                self.precision, other.precision
            )));
        }
        if self.seed != other.seed {
            return Err(SketchError::ParameterMismatch(format!(
                "HyperLogLog seed {} vs {}",
                self.seed, other.seed
            )));
        }
        Ok(())
    }
}

impl Mergeable for HyperLogLog {
    type Config = HyperLogLogConfig;

    fn zero(config: &Self::Config) -> Result<Self, SketchError> {
        Self::new(*config)
    }

    fn config(&self) -> Self::Config {
        HyperLogLogConfig {
            precision: self.precision,
            seed: self.seed,
        }
    }

    fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        self.check_compatible(other)?;
        for (mine, &theirs) in self.registers.iter_mut().zip(&other.registers) {
            if theirs > *mine {
                *mine = theirs;
            }
        }
        Ok(())
    }
}

impl Sketch for HyperLogLog {
    const KIND: SketchKind = SketchKind::HyperLogLog;

    fn validate(&self) -> Result<(), SketchError> {
        self.config().validate()?;
        if self.registers.len() != 1 << self.precision {
            return Err(SketchError::InvalidInput(format!(
                "Invalid register count: expected {}, got {}",
                1usize << self.precision,
                self.registers.len()
            )));
        }
        let max_rank = self.max_rank();
        if let Some(bad) = self.registers.iter().find(|&&r| r > max_rank) {
            return Err(SketchError::InvalidInput(format!(
                "Register value {} exceeds maximum rank {}",
                bad, max_rank
            )));
        }
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.registers.iter().all(|&r| r == 0)
    }
}

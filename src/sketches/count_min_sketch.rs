// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::enums::SketchKind;
use crate::sketches::{double_hash_positions, hash128};
use crate::traits::{Mergeable, Sketch, SketchError};
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// Upper bound on `depth * width` counters.
const MAX_COUNTERS: usize = 1 << 28;

/// Construction parameters for [`CountMinSketch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CountMinConfig {
    /// Number of hash rows.
    pub depth: usize,
    /// Number of counters per row.
    pub width: usize,
    #[serde(default)]
    pub seed: u64,
}

impl Default for CountMinConfig {
    fn default() -> Self {
        Self {
            depth: 5,
            width: 1000,
            seed: 0,
        }
    }
}

impl CountMinConfig {
    pub fn new(depth: usize, width: usize) -> Result<Self, SketchError> {
        let config = Self {
            depth,
            width,
            seed: 0,
        };
        config.validate()?;
        Ok(config)
    }

    /// Dimensions giving overestimate at most `epsilon * total` with probability `1 - delta`:
    /// `width = ceil(e / epsilon)`, `depth = ceil(ln(1 / delta))`.
    pub fn from_error_bounds(epsilon: f64, delta: f64) -> Result<Self, SketchError> {
        if !(epsilon > 0.0 && epsilon < 1.0) || !(delta > 0.0 && delta < 1.0) {
            return Err(SketchError::InvalidParameter(format!(
                "Count-Min error bounds must be in (0, 1), got epsilon={} delta={}",
                epsilon, delta
            )));
        }
        let width = (std::f64::consts::E / epsilon).ceil() as usize;
        let depth = ((1.0 / delta).ln().ceil() as usize).max(1);
        Self::new(depth, width)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), SketchError> {
        if self.depth == 0 || self.width == 0 {
            return Err(SketchError::InvalidParameter(format!(
                "Count-Min dimensions must be positive, got {}x{}",
                self.depth, self.width
            )));
        }
        match self.depth.checked_mul(self.width) {
            Some(total) if total <= MAX_COUNTERS => Ok(()),
            _ => Err(SketchError::InvalidParameter(format!(
                "Count-Min dimensions {}x{} exceed {} counters",
                self.depth, self.width, MAX_COUNTERS
            ))),
        }
    }
}

/// Count-Min Sketch - Frequency Estimation
///
/// A probabilistic data structure for estimating the frequency of events in a stream of data.
/// It uses a matrix of counters and one hash position per row.
///
/// # Key Properties
///
/// - **Fixed Memory**: `depth` × `width` × 8 bytes, regardless of the number of unique items.
/// - **Conservative**: Frequencies are never underestimated, but may be overestimated due to collisions.
/// - **Mergeable**: Merged by summing the corresponding counters.
///
/// # Algebraic Properties
///
/// - **Associativity**: Yes (Matrix addition is associative).
/// - **Identity**: The all-zero matrix of the same dimensions.
/// - **Idempotence**: **NO**. Merging the same sketch twice doubles the counts.
///
/// # Example
///
/// ```
/// use stream_sketches::{CountMinConfig, CountMinSketch, Mergeable};
///
/// let mut cms = CountMinSketch::zero(&CountMinConfig::new(5, 100).unwrap()).unwrap();
/// cms.add("apple", 1);
/// cms.add("apple", 1);
/// cms.add("banana", 1);
///
/// assert!(cms.estimate("apple") >= 2);
/// assert!(cms.estimate("banana") >= 1);
/// assert_eq!(cms.estimate("cherry"), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CountMinSketch {
    depth: usize,
    width: usize,
    seed: u64,
    /// Sum of every weight added.
    total: u64,
    /// The matrix of counters, one row per hash function.
    matrix: Vec<Vec<u64>>,
}

impl CountMinSketch {
    pub fn new(config: CountMinConfig) -> Result<Self, SketchError> {
        config.validate()?;
        Ok(Self {
            depth: config.depth,
            width: config.width,
            seed: config.seed,
            total: 0,
            matrix: vec![vec![0; config.width]; config.depth],
        })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Sum of every weight added, across merges.
    pub fn total_count(&self) -> u64 {
        self.total
    }

    fn columns<T: Hash + ?Sized>(&self, item: &T) -> impl Iterator<Item = usize> {
        double_hash_positions(hash128(self.seed, item), self.depth as u64, self.width as u64)
            .map(|col| col as usize)
    }

    /// Increments one counter per row for `item` by `weight`.
    pub fn add<T: Hash + ?Sized>(&mut self, item: &T, weight: u64) {
        let hashes = hash128(self.seed, item);
        let columns = double_hash_positions(hashes, self.depth as u64, self.width as u64);
        for (row, col) in self.matrix.iter_mut().zip(columns) {
            let counter = &mut row[col as usize];
            *counter = counter.saturating_add(weight);
        }
        self.total = self.total.saturating_add(weight);
    }

    /// Minimum counter across rows; never below the true frequency.
    pub fn estimate<T: Hash + ?Sized>(&self, item: &T) -> u64 {
        self.matrix
            .iter()
            .zip(self.columns(item))
            .map(|(row, col)| row[col])
            .min()
            .unwrap_or(0)
    }

    fn check_compatible(&self, other: &Self) -> Result<(), SketchError> {
        if self.depth != other.depth || self.width != other.width || self.seed != other.seed {
            tracing::warn!(
                left_depth = self.depth,
                left_width = self.width,
                right_depth = other.depth,
                right_width = other.width,
                "rejected Count-Min merge with mismatched dimensions"
            );
            return Err(SketchError::ParameterMismatch(format!(
                "Count-Min dimensions {}x{} (seed {}) vs {}x{} (seed {})",
                self.depth, self.width, self.seed, other.depth, other.width, other.seed
            )));
        }
        Ok(())
    }
}

impl Mergeable for CountMinSketch {
    type Config = CountMinConfig;

    fn zero(config: &Self::Config) -> Result<Self, SketchError> {
        Self::new(*config)
    }

    fn config(&self) -> Self::Config {
        CountMinConfig {
            depth: self.depth,
            width: self.width,
            seed: self.seed,
        }
    }

    fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        self.check_compatible(other)?;
        for (row, other_row) in self.matrix.iter_mut().zip(&other.matrix) {
            for (counter, &theirs) in row.iter_mut().zip(other_row) {
                *counter = counter.saturating_add(theirs);
            }
        }
        self.total = self.total.saturating_add(other.total);
        Ok(())
    }
}

impl Sketch for CountMinSketch {
    const KIND: SketchKind = SketchKind::CountMinSketch;

    fn validate(&self) -> Result<(), SketchError> {
        self.config().validate()?;
        if self.matrix.len() != self.depth {
            return Err(SketchError::InvalidInput("Matrix depth mismatch".into()));
        }
        if self.matrix.iter().any(|row| row.len() != self.width) {
            return Err(SketchError::InvalidInput("Matrix width mismatch".into()));
        }
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.total == 0 && self.matrix.iter().all(|row| row.iter().all(|&x| x == 0))
    }
}

// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::enums::SketchKind;
use crate::sketches::{double_hash_positions, hash128};
use crate::traits::{Mergeable, Sketch, SketchError};
use serde::{Deserialize, Serialize};
use std::f64::consts::LN_2;
use std::hash::Hash;

/// Upper bound on the bit array (4 GiB of bits).
const MAX_BITS: u64 = 1 << 35;

/// Construction parameters for [`BloomFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BloomFilterConfig {
    /// Expected number of distinct items.
    pub capacity: u64,
    /// Target false-positive rate while holding at most `capacity` items.
    pub error_rate: f64,
}

impl Default for BloomFilterConfig {
    fn default() -> Self {
        Self {
            capacity: 1_000_000,
            error_rate: 0.001,
        }
    }
}

impl BloomFilterConfig {
    pub fn new(capacity: u64, error_rate: f64) -> Result<Self, SketchError> {
        let config = Self {
            capacity,
            error_rate,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SketchError> {
        if self.capacity == 0 {
            return Err(SketchError::InvalidParameter(
                "Bloom filter capacity must be positive".into(),
            ));
        }
        if !(self.error_rate > 0.0 && self.error_rate < 1.0) {
            return Err(SketchError::InvalidParameter(format!(
                "Bloom filter error rate must be in (0, 1), got {}",
                self.error_rate
            )));
        }
        if self.num_bits() > MAX_BITS {
            return Err(SketchError::InvalidParameter(format!(
                "Bloom filter of capacity {} at error rate {} needs {} bits (max {})",
                self.capacity,
                self.error_rate,
                self.num_bits(),
                MAX_BITS
            )));
        }
        Ok(())
    }

    /// `m = ceil(-n * ln(eps) / ln(2)^2)`
    pub fn num_bits(&self) -> u64 {
        let n = self.capacity as f64;
        let bits = (-n * self.error_rate.ln() / (LN_2 * LN_2)).ceil();
        (bits as u64).max(1)
    }

    /// `k = round(m / n * ln(2))`
    pub fn num_hashes(&self) -> u32 {
        let k = (self.num_bits() as f64 / self.capacity as f64 * LN_2).round();
        (k as u32).max(1)
    }
}

/// Bloom Filter - Approximate Set Membership
///
/// Answers "possibly present" or "definitely absent" with a bounded false-positive rate.
///
/// # Key Properties
///
/// - **No False Negatives**: every added item always tests positive.
/// - **Bounded False Positives**: about `error_rate` while holding at most `capacity` items.
/// - **Mergeable**: union is the bitwise OR of equally-sized filters. After a union the
///   effective false-positive rate is that of a single filter holding the union's items, so
///   the configured rate no longer holds once the combined cardinality exceeds `capacity`.
///
/// # Example
///
/// ```
/// use stream_sketches::{BloomFilter, BloomFilterConfig, Mergeable};
///
/// let config = BloomFilterConfig::new(1000, 0.01).unwrap();
/// let mut morning = BloomFilter::zero(&config).unwrap();
/// morning.add("user1");
///
/// let mut afternoon = BloomFilter::zero(&config).unwrap();
/// afternoon.add("user2");
///
/// let day = morning.combine(&afternoon).unwrap();
/// assert!(day.contains("user1"));
/// assert!(day.contains("user2"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BloomFilter {
    capacity: u64,
    error_rate: f64,
    num_bits: u64,
    num_hashes: u32,
    bits: Vec<u64>,
}

impl BloomFilter {
    pub fn new(config: BloomFilterConfig) -> Result<Self, SketchError> {
        config.validate()?;
        let num_bits = config.num_bits();
        Ok(Self {
            capacity: config.capacity,
            error_rate: config.error_rate,
            num_bits,
            num_hashes: config.num_hashes(),
            bits: vec![0u64; Self::words_for(num_bits)],
        })
    }

    fn words_for(num_bits: u64) -> usize {
        num_bits.div_ceil(64) as usize
    }

    pub fn num_bits(&self) -> u64 {
        self.num_bits
    }

    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    fn positions<T: Hash + ?Sized>(&self, item: &T) -> impl Iterator<Item = u64> {
        double_hash_positions(hash128(0, item), u64::from(self.num_hashes), self.num_bits)
    }

    fn bit(&self, position: u64) -> bool {
        self.bits[(position / 64) as usize] & (1 << (position % 64)) != 0
    }

    /// Add an item to the filter.
    pub fn add<T: Hash + ?Sized>(&mut self, item: &T) {
        let hashes = hash128(0, item);
        for position in double_hash_positions(hashes, u64::from(self.num_hashes), self.num_bits) {
            self.bits[(position / 64) as usize] |= 1 << (position % 64);
        }
    }

    /// True if the item might be in the set, false if it definitely is not.
    pub fn contains<T: Hash + ?Sized>(&self, item: &T) -> bool {
        self.positions(item).all(|position| self.bit(position))
    }

    fn set_bits(&self) -> u64 {
        self.bits.iter().map(|word| u64::from(word.count_ones())).sum()
    }

    /// Fraction of bits currently set.
    pub fn fill_ratio(&self) -> f64 {
        self.set_bits() as f64 / self.num_bits as f64
    }

    /// Estimate of the number of distinct items added, `-m/k * ln(1 - X/m)`.
    pub fn estimated_count(&self) -> u64 {
        let set = self.set_bits();
        if set == 0 {
            return 0;
        }
        let fill = set as f64 / self.num_bits as f64;
        if fill >= 1.0 {
            return self.capacity;
        }
        let m = self.num_bits as f64;
        let k = f64::from(self.num_hashes);
        (-m / k * (1.0 - fill).ln()).round() as u64
    }

    /// Current false-positive rate, `(1 - e^(-k*n/m))^k` over the estimated count.
    pub fn current_error_rate(&self) -> f64 {
        let n = self.estimated_count();
        if n == 0 {
            return 0.0;
        }
        let k = f64::from(self.num_hashes);
        (1.0 - (-k * n as f64 / self.num_bits as f64).exp()).powf(k)
    }

    fn check_compatible(&self, other: &Self) -> Result<(), SketchError> {
        if self.num_bits != other.num_bits || self.num_hashes != other.num_hashes {
            tracing::warn!(
                left_bits = self.num_bits,
                right_bits = other.num_bits,
                left_hashes = self.num_hashes,
                right_hashes = other.num_hashes,
                "rejected Bloom filter merge with mismatched shape"
            );
            return Err(SketchError::ParameterMismatch(format!(
                "Bloom filter shape {}x{} vs {}x{}",
                self.num_bits, self.num_hashes, other.num_bits, other.num_hashes
            )));
        }
        Ok(())
    }

    /// Intersection of two filters (bitwise AND).
    ///
    /// Items present in both inputs always test positive; the false-positive rate of the
    /// result can exceed that of either input.
    pub fn intersection(&self, other: &Self) -> Result<Self, SketchError> {
        self.check_compatible(other)?;
        let mut result = self.clone();
        for (mine, theirs) in result.bits.iter_mut().zip(&other.bits) {
            *mine &= theirs;
        }
        Ok(result)
    }
}

impl Mergeable for BloomFilter {
    type Config = BloomFilterConfig;

    fn zero(config: &Self::Config) -> Result<Self, SketchError> {
        Self::new(*config)
    }

    fn config(&self) -> Self::Config {
        BloomFilterConfig {
            capacity: self.capacity,
            error_rate: self.error_rate,
        }
    }

    fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        self.check_compatible(other)?;
        for (mine, theirs) in self.bits.iter_mut().zip(&other.bits) {
            *mine |= theirs;
        }
        Ok(())
    }
}

/// Bloom filters under intersection.
///
/// The identity is the filter with every bit set, so folding any number of filters through
/// the composer keeps only bits set in all of them: items present in every input always test
/// positive. Each intersection can only raise the false-positive rate, and an empty fold
/// answers "possibly present" for everything.
///
/// # Example
///
/// ```
/// use stream_sketches::aggregation::fold_sequence;
/// use stream_sketches::{BloomFilter, BloomFilterConfig, BloomIntersection, Mergeable};
///
/// let config = BloomFilterConfig::new(1000, 0.01).unwrap();
/// let days: Vec<BloomIntersection> = (0..3)
///     .map(|day| {
///         let mut bf = BloomFilter::zero(&config).unwrap();
///         bf.add("loyal-user");
///         bf.add(&format!("visitor-{}", day));
///         BloomIntersection::from(bf)
///     })
///     .collect();
///
/// let every_day = fold_sequence(&config, &days).unwrap();
/// assert!(every_day.contains("loyal-user"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BloomIntersection(BloomFilter);

impl BloomIntersection {
    pub fn contains<T: Hash + ?Sized>(&self, item: &T) -> bool {
        self.0.contains(item)
    }

    pub fn filter(&self) -> &BloomFilter {
        &self.0
    }

    pub fn into_inner(self) -> BloomFilter {
        self.0
    }

    /// Filter of the items present in all of `filters`.
    pub fn common<'a, I>(config: &BloomFilterConfig, filters: I) -> Result<BloomFilter, SketchError>
    where
        I: IntoIterator<Item = &'a BloomFilter>,
    {
        let mut acc = Self::zero(config)?;
        for filter in filters {
            acc.0 = acc.0.intersection(filter)?;
        }
        Ok(acc.0)
    }
}

impl From<BloomFilter> for BloomIntersection {
    fn from(filter: BloomFilter) -> Self {
        Self(filter)
    }
}

impl Mergeable for BloomIntersection {
    type Config = BloomFilterConfig;

    fn zero(config: &Self::Config) -> Result<Self, SketchError> {
        let mut filter = BloomFilter::new(*config)?;
        filter.bits.fill(u64::MAX);
        let tail = filter.num_bits % 64;
        if tail != 0 {
            if let Some(last) = filter.bits.last_mut() {
                *last = (1u64 << tail) - 1;
            }
        }
        Ok(Self(filter))
    }

    fn config(&self) -> Self::Config {
        self.0.config()
    }

    fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        self.0.check_compatible(&other.0)?;
        for (mine, theirs) in self.0.bits.iter_mut().zip(&other.0.bits) {
            *mine &= theirs;
        }
        Ok(())
    }
}

impl Sketch for BloomFilter {
    const KIND: SketchKind = SketchKind::BloomFilter;

    fn validate(&self) -> Result<(), SketchError> {
        let config = self.config();
        config.validate()?;
        if self.num_bits != config.num_bits() || self.num_hashes != config.num_hashes() {
            return Err(SketchError::InvalidInput(format!(
                "Bloom filter shape {}x{} does not match capacity {} at error rate {}",
                self.num_bits, self.num_hashes, self.capacity, self.error_rate
            )));
        }
        if self.bits.len() != Self::words_for(self.num_bits) {
            return Err(SketchError::InvalidInput(format!(
                "Invalid word count: expected {}, got {}",
                Self::words_for(self.num_bits),
                self.bits.len()
            )));
        }
        let tail = self.num_bits % 64;
        if tail != 0 {
            let last = self.bits[self.bits.len() - 1];
            if last >> tail != 0 {
                return Err(SketchError::InvalidInput(
                    "Bits set beyond the end of the filter".into(),
                ));
            }
        }
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.bits.iter().all(|&word| word == 0)
    }
}

// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::enums::SketchKind;
use crate::traits::{Mergeable, Sketch, SketchError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Construction parameters for [`SpaceSaving`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpaceSavingConfig {
    /// Maximum number of tracked items (K).
    pub capacity: usize,
}

impl Default for SpaceSavingConfig {
    fn default() -> Self {
        Self { capacity: 100 }
    }
}

impl SpaceSavingConfig {
    pub fn new(capacity: usize) -> Result<Self, SketchError> {
        let config = Self { capacity };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SketchError> {
        if self.capacity == 0 {
            return Err(SketchError::InvalidParameter(
                "Space-Saving capacity must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// A tracked item with its estimated count and the bound on its overestimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Counter {
    pub item: String,
    pub count: u64,
    /// `count - error <= true count <= count`
    pub error: u64,
}

/// Space-Saving - Heavy Hitter Tracking
///
/// Tracks at most K items with approximate counts. Counters are kept in insertion order,
/// which is the first tie-break when ranking (after count, before the item key).
///
/// # Error Bound
///
/// Every tracked item satisfies `true <= count <= true + error`. The `floor` bounds the true
/// count of any item that is *not* tracked; it stays at zero until an eviction or a merge
/// drops an item.
///
/// # Merging
///
/// Merging sums counts for items tracked on both sides. An item tracked on one side only
/// receives the other side's `floor`, so its bound survives the merge. The result is then
/// truncated to the K highest counts.
///
/// Identity holds exactly. Associativity holds exactly while the union of tracked items fits
/// in K; once truncation drops items the retained counts still honor the error bound.
///
/// # Example
///
/// ```
/// use stream_sketches::{Mergeable, SpaceSaving, SpaceSavingConfig};
///
/// let mut hitters = SpaceSaving::zero(&SpaceSavingConfig::new(3).unwrap()).unwrap();
/// hitters.add("apple", 10);
/// hitters.add("banana", 20);
/// hitters.add("cherry", 5);
/// hitters.add("date", 15);
///
/// // "date" replaced "cherry" and inherited its count of 5.
/// let top = hitters.top(2);
/// assert_eq!(top[0], ("banana".to_string(), 20));
/// assert_eq!(top[1], ("date".to_string(), 20));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpaceSaving {
    capacity: usize,
    floor: u64,
    counters: Vec<Counter>,
}

impl SpaceSaving {
    pub fn new(config: SpaceSavingConfig) -> Result<Self, SketchError> {
        config.validate()?;
        Ok(Self {
            capacity: config.capacity,
            floor: 0,
            counters: Vec::new(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Upper bound on the true count of any untracked item.
    pub fn floor(&self) -> u64 {
        self.floor
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Tracked counters in insertion order.
    pub fn entries(&self) -> &[Counter] {
        &self.counters
    }

    fn position(&self, item: &str) -> Option<usize> {
        self.counters.iter().position(|c| c.item == item)
    }

    /// Count highest first, then earliest inserted, then item key.
    fn rank(counters: &[Counter], a: usize, b: usize) -> Ordering {
        counters[b]
            .count
            .cmp(&counters[a].count)
            .then(a.cmp(&b))
            .then_with(|| counters[a].item.cmp(&counters[b].item))
    }

    pub(crate) fn ranked_indices(counters: &[Counter]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..counters.len()).collect();
        order.sort_by(|&a, &b| Self::rank(counters, a, b));
        order
    }

    /// Adds `weight` occurrences of `item`.
    pub fn add(&mut self, item: &str, weight: u64) {
        if let Some(pos) = self.position(item) {
            let counter = &mut self.counters[pos];
            counter.count = counter.count.saturating_add(weight);
            return;
        }

        if self.counters.len() < self.capacity {
            self.counters.push(Counter {
                item: item.to_string(),
                count: self.floor.saturating_add(weight),
                error: self.floor,
            });
            return;
        }

        // Full: replace the lowest-ranked counter (min count, latest inserted).
        let victim = (0..self.counters.len())
            .max_by(|&a, &b| Self::rank(&self.counters, a, b))
            .unwrap_or(0);
        let evicted = self.counters.remove(victim);
        tracing::trace!(evicted = %evicted.item, count = evicted.count, "space-saving eviction");
        self.floor = self.floor.max(evicted.count);
        self.counters.push(Counter {
            item: item.to_string(),
            count: evicted.count.saturating_add(weight),
            error: evicted.count,
        });
    }

    /// Estimated count of a tracked item, `None` if untracked.
    pub fn estimate(&self, item: &str) -> Option<u64> {
        self.position(item).map(|pos| self.counters[pos].count)
    }

    /// Overestimate bound recorded for a tracked item.
    pub fn error_bound(&self, item: &str) -> Option<u64> {
        self.position(item).map(|pos| self.counters[pos].error)
    }

    /// The `n` highest-ranked counters.
    pub fn top_counters(&self, n: usize) -> Vec<Counter> {
        Self::ranked_indices(&self.counters)
            .into_iter()
            .take(n)
            .map(|i| self.counters[i].clone())
            .collect()
    }

    /// The `n` highest `(item, count)` pairs; ties go to the earlier-inserted item.
    pub fn top(&self, n: usize) -> Vec<(String, u64)> {
        self.top_counters(n)
            .into_iter()
            .map(|c| (c.item, c.count))
            .collect()
    }

    fn check_compatible(&self, other: &Self) -> Result<(), SketchError> {
        if self.capacity != other.capacity {
            tracing::warn!(
                left = self.capacity,
                right = other.capacity,
                "rejected Space-Saving merge with mismatched capacity"
            );
            return Err(SketchError::ParameterMismatch(format!(
                "Space-Saving capacity {} vs {}",
                self.capacity, other.capacity
            )));
        }
        Ok(())
    }
}

impl Mergeable for SpaceSaving {
    type Config = SpaceSavingConfig;

    fn zero(config: &Self::Config) -> Result<Self, SketchError> {
        Self::new(*config)
    }

    fn config(&self) -> Self::Config {
        SpaceSavingConfig {
            capacity: self.capacity,
        }
    }

    fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        self.check_compatible(other)?;

        let theirs: HashMap<&str, &Counter> = other
            .counters
            .iter()
            .map(|c| (c.item.as_str(), c))
            .collect();
        let mine: HashSet<&str> = self.counters.iter().map(|c| c.item.as_str()).collect();

        let mut merged: Vec<Counter> = Vec::with_capacity(self.counters.len() + other.counters.len());
        for counter in &self.counters {
            let (count, error) = match theirs.get(counter.item.as_str()) {
                Some(o) => (
                    counter.count.saturating_add(o.count),
                    counter.error.saturating_add(o.error),
                ),
                None => (
                    counter.count.saturating_add(other.floor),
                    counter.error.saturating_add(other.floor),
                ),
            };
            merged.push(Counter {
                item: counter.item.clone(),
                count,
                error,
            });
        }
        for counter in other.counters.iter().filter(|c| !mine.contains(c.item.as_str())) {
            merged.push(Counter {
                item: counter.item.clone(),
                count: counter.count.saturating_add(self.floor),
                error: counter.error.saturating_add(self.floor),
            });
        }

        let mut floor = self.floor.saturating_add(other.floor);
        if merged.len() > self.capacity {
            let order = Self::ranked_indices(&merged);
            let mut keep = vec![false; merged.len()];
            for &i in &order[..self.capacity] {
                keep[i] = true;
            }
            for &i in &order[self.capacity..] {
                floor = floor.max(merged[i].count);
            }
            tracing::debug!(
                dropped = merged.len() - self.capacity,
                floor,
                "space-saving merge truncated"
            );
            merged = merged
                .into_iter()
                .zip(keep)
                .filter_map(|(c, kept)| kept.then_some(c))
                .collect();
        }

        self.counters = merged;
        self.floor = floor;
        Ok(())
    }
}

impl Sketch for SpaceSaving {
    const KIND: SketchKind = SketchKind::SpaceSaving;

    fn validate(&self) -> Result<(), SketchError> {
        self.config().validate()?;
        if self.counters.len() > self.capacity {
            return Err(SketchError::InvalidInput(format!(
                "{} counters exceed capacity {}",
                self.counters.len(),
                self.capacity
            )));
        }
        let mut seen = HashSet::new();
        for counter in &self.counters {
            if !seen.insert(counter.item.as_str()) {
                return Err(SketchError::InvalidInput(format!(
                    "Duplicate counter for {:?}",
                    counter.item
                )));
            }
            if counter.error > counter.count || counter.count < self.floor {
                return Err(SketchError::InvalidInput(format!(
                    "Counter {:?} violates its bounds (count {}, error {}, floor {})",
                    counter.item, counter.count, counter.error, self.floor
                )));
            }
        }
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.counters.is_empty() && self.floor == 0
    }
}

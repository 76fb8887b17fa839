// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

//! Aggregation Composer
//!
//! Generic folds over any [`Mergeable`] type. Nothing here knows which sketch it is folding:
//! hourly-to-daily rollups, cross-system totals and worker merges are all the same left fold
//! from `zero(config)`, and the merge laws make the result independent of how the inputs were
//! grouped.
//!
//! Every fold walks its input in a fixed order (slice order or ascending key order) so that
//! logs and floating-point results are reproducible.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use stream_sketches::aggregation::{rollup_by_key, CompositeRollup};
//! use stream_sketches::{HyperLogLog, HyperLogLogConfig, Mergeable};
//!
//! let config = HyperLogLogConfig::new(12).unwrap();
//! let mut hourly = BTreeMap::new();
//! for hour in 0..24u32 {
//!     let mut hll = HyperLogLog::zero(&config).unwrap();
//!     hll.add(&format!("user-{}", hour % 6));
//!     hourly.insert(hour, hll);
//! }
//!
//! let daily = rollup_by_key(&config, &hourly).unwrap();
//! assert!((5..=7).contains(&daily.cardinality()));
//!
//! let mut nested = BTreeMap::new();
//! nested.insert("web", hourly.clone());
//! nested.insert("mobile", hourly);
//! let composite = CompositeRollup::new(&config, &nested).unwrap();
//! assert_eq!(composite.total(), &daily);
//! assert_eq!(composite.by_time().len(), 24);
//! ```

use crate::traits::{Mergeable, SketchError};
use std::collections::BTreeMap;

/// Folds `values` left to right starting from `zero(config)`.
///
/// An empty input yields the identity.
pub fn fold_sequence<'a, T, I>(config: &T::Config, values: I) -> Result<T, SketchError>
where
    T: Mergeable + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut acc = T::zero(config)?;
    let mut folded = 0usize;
    for value in values {
        acc.merge(value)?;
        folded += 1;
    }
    tracing::debug!(inputs = folded, "folded sequence");
    Ok(acc)
}

/// Folds the values of a keyed mapping, ignoring the keys (e.g. hourly to daily).
pub fn rollup_by_key<K, T>(config: &T::Config, mapping: &BTreeMap<K, T>) -> Result<T, SketchError>
where
    K: Ord,
    T: Mergeable,
{
    fold_sequence(config, mapping.values())
}

/// Folds per-system partial results into one total.
pub fn rollup_across_systems<S, T>(
    config: &T::Config,
    mapping: &BTreeMap<S, T>,
) -> Result<T, SketchError>
where
    S: Ord,
    T: Mergeable,
{
    rollup_by_key(config, mapping)
}

/// Folds partial results produced by parallel workers.
pub fn rollup_workers<T: Mergeable>(config: &T::Config, partials: &[T]) -> Result<T, SketchError> {
    fold_sequence(config, partials)
}

/// Folds only the `Some` entries; `None` when every entry is absent.
pub fn fold_present<'a, T, I>(config: &T::Config, values: I) -> Result<Option<T>, SketchError>
where
    T: Mergeable + 'a,
    I: IntoIterator<Item = Option<&'a T>>,
{
    let mut acc: Option<T> = None;
    for value in values.into_iter().flatten() {
        match acc.as_mut() {
            Some(total) => total.merge(value)?,
            None => {
                let mut total = T::zero(config)?;
                total.merge(value)?;
                acc = Some(total);
            }
        }
    }
    Ok(acc)
}

/// Balanced pairwise reduction, the shape a pool of workers produces when each merges two
/// neighbours at a time.
pub fn fold_tree<T: Mergeable>(config: &T::Config, values: &[T]) -> Result<T, SketchError> {
    match values {
        [] => T::zero(config),
        [single] => {
            let mut acc = T::zero(config)?;
            acc.merge(single)?;
            Ok(acc)
        }
        _ => {
            let (left, right) = values.split_at(values.len() / 2);
            let mut acc = fold_tree(config, left)?;
            acc.merge(&fold_tree(config, right)?)?;
            Ok(acc)
        }
    }
}

/// Result of [`fold_lenient`].
#[derive(Debug, Clone, PartialEq)]
pub struct LenientFold<T> {
    pub value: T,
    /// Positions of the inputs that could not be merged.
    pub skipped: Vec<usize>,
}

/// Folds `values`, skipping any input whose merge fails instead of aborting.
///
/// This is the partial-aggregation fallback for callers that would rather answer from the
/// compatible inputs than fail the whole rollup. Each skipped input is logged.
pub fn fold_lenient<'a, T, I>(config: &T::Config, values: I) -> Result<LenientFold<T>, SketchError>
where
    T: Mergeable + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut value = T::zero(config)?;
    let mut skipped = Vec::new();
    for (index, item) in values.into_iter().enumerate() {
        if let Err(e) = value.merge(item) {
            tracing::warn!(index, kind = e.kind(), error = %e, "skipping input in lenient fold");
            skipped.push(index);
        }
    }
    Ok(LenientFold { value, skipped })
}

/// Folds the `n` greatest keys, i.e. the most recent buckets of a time-keyed mapping.
pub fn rollup_latest<K, T>(
    config: &T::Config,
    mapping: &BTreeMap<K, T>,
    n: usize,
) -> Result<T, SketchError>
where
    K: Ord,
    T: Mergeable,
{
    let skip = mapping.len().saturating_sub(n);
    fold_sequence(config, mapping.values().skip(skip))
}

/// Folds only the listed keys; keys missing from the mapping are ignored.
pub fn rollup_subset<K, T>(
    config: &T::Config,
    mapping: &BTreeMap<K, T>,
    keys: &[K],
) -> Result<T, SketchError>
where
    K: Ord,
    T: Mergeable,
{
    fold_sequence(config, keys.iter().filter_map(|k| mapping.get(k)))
}

/// Keyed merge: values under the same key are combined, the rest are carried over.
pub fn merge_maps<'a, K, T, I>(maps: I) -> Result<BTreeMap<K, T>, SketchError>
where
    K: Ord + Clone + 'a,
    T: Mergeable + 'a,
    I: IntoIterator<Item = &'a BTreeMap<K, T>>,
{
    let mut merged: BTreeMap<K, T> = BTreeMap::new();
    for map in maps {
        for (key, value) in map {
            match merged.get_mut(key) {
                Some(existing) => existing.merge(value)?,
                None => {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }
    }
    Ok(merged)
}

/// Two-axis rollup of `system -> time -> value`.
///
/// Exposes the grand total, a total per system (folding across time) and a total per time
/// key (folding across systems, i.e. the transposed mapping).
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeRollup<S, Tm, T> {
    total: T,
    by_system: BTreeMap<S, T>,
    by_time: BTreeMap<Tm, T>,
}

impl<S, Tm, T> CompositeRollup<S, Tm, T>
where
    S: Ord + Clone,
    Tm: Ord + Clone,
    T: Mergeable,
{
    pub fn new(
        config: &T::Config,
        nested: &BTreeMap<S, BTreeMap<Tm, T>>,
    ) -> Result<Self, SketchError> {
        let mut by_system = BTreeMap::new();
        for (system, series) in nested {
            by_system.insert(system.clone(), rollup_by_key(config, series)?);
        }

        let mut by_time: BTreeMap<Tm, T> = BTreeMap::new();
        for series in nested.values() {
            for (time, value) in series {
                match by_time.get_mut(time) {
                    Some(acc) => acc.merge(value)?,
                    None => {
                        let mut acc = T::zero(config)?;
                        acc.merge(value)?;
                        by_time.insert(time.clone(), acc);
                    }
                }
            }
        }

        let total = rollup_across_systems(config, &by_system)?;
        tracing::debug!(
            systems = by_system.len(),
            buckets = by_time.len(),
            "built composite rollup"
        );
        Ok(Self {
            total,
            by_system,
            by_time,
        })
    }

    pub fn total(&self) -> &T {
        &self.total
    }

    pub fn by_system(&self) -> &BTreeMap<S, T> {
        &self.by_system
    }

    pub fn by_time(&self) -> &BTreeMap<Tm, T> {
        &self.by_time
    }
}

/// Incremental accumulator: a running fold that can be fed one value at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregator<T: Mergeable> {
    value: T,
}

impl<T: Mergeable> Aggregator<T> {
    pub fn new(config: &T::Config) -> Result<Self, SketchError> {
        Ok(Self {
            value: T::zero(config)?,
        })
    }

    pub fn append(&mut self, value: &T) -> Result<(), SketchError> {
        self.value.merge(value)
    }

    /// Appends every value, stopping at the first failure. Values before the failure stay
    /// merged.
    pub fn append_all<'a, I>(&mut self, values: I) -> Result<(), SketchError>
    where
        T: 'a,
        I: IntoIterator<Item = &'a T>,
    {
        for value in values {
            self.value.merge(value)?;
        }
        Ok(())
    }

    pub fn merge(&mut self, other: &Aggregator<T>) -> Result<(), SketchError> {
        self.value.merge(&other.value)
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Returns to the identity for the current configuration.
    pub fn reset(&mut self) -> Result<(), SketchError> {
        self.value = T::zero(&self.value.config())?;
        Ok(())
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

//! Keyed accumulator store.
//!
//! An event processor owns one sketch per `(metric, system, bucket)`. [`SketchStore`] gives
//! each key an explicit lifecycle:
//!
//! 1. **Created** on the first [`update`](SketchStore::update), either reconstructed from the
//!    persistence collaborator or as `zero(config)`.
//! 2. **Mutated** in place under the entry's lock; concurrent writers to the same key are
//!    serialized, writers to different keys are not.
//! 3. **Flushed** through [`Sketch::to_bytes`] into the [`SketchStorage`].
//!
//! The store never names storage keys or sets expiry; that belongs to the storage
//! implementation.
//!
//! # Example
//!
//! ```
//! use stream_sketches::store::{MemoryStorage, SketchKey, SketchStore};
//! use stream_sketches::{HyperLogLog, HyperLogLogConfig};
//!
//! let store: SketchStore<HyperLogLog, _> =
//!     SketchStore::new(HyperLogLogConfig::new(12).unwrap(), MemoryStorage::new()).unwrap();
//! let key = SketchKey::new("users", "web", "1h:2025-10-16T10:00:00");
//!
//! store.update(&key, |hll| hll.add("alice")).unwrap();
//! store.update(&key, |hll| hll.add("bob")).unwrap();
//! assert_eq!(store.flush().unwrap(), 1);
//!
//! let saved = store.snapshot(&key).unwrap().unwrap();
//! assert_eq!(saved.cardinality(), 2);
//! ```

use crate::aggregation::fold_sequence;
use crate::traits::{Sketch, SketchError};
use crate::window::TimeWindow;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Identity of one accumulator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SketchKey {
    pub metric: String,
    pub system: String,
    pub bucket: String,
}

impl SketchKey {
    pub fn new(
        metric: impl Into<String>,
        system: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            metric: metric.into(),
            system: system.into(),
            bucket: bucket.into(),
        }
    }

    /// Key of the bucket an event at `ts` falls into. The bucket is prefixed with the window
    /// so labels of different windows never collide.
    pub fn for_event(metric: &str, system: &str, window: TimeWindow, ts: DateTime<Utc>) -> Self {
        Self::new(metric, system, format!("{}:{}", window, window.bucket(ts)))
    }
}

impl fmt::Display for SketchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.metric, self.system, self.bucket)
    }
}

/// The persistence collaborator: holds opaque payloads by key.
pub trait SketchStorage: Send + Sync {
    fn load(&self, key: &SketchKey) -> Result<Option<Vec<u8>>, SketchError>;

    fn save(&self, key: &SketchKey, payload: Vec<u8>) -> Result<(), SketchError>;

    /// Every stored key for `metric`.
    fn keys(&self, metric: &str) -> Result<Vec<SketchKey>, SketchError>;
}

/// In-process [`SketchStorage`].
#[derive(Debug, Default)]
pub struct MemoryStorage {
    payloads: DashMap<SketchKey, Vec<u8>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}

impl SketchStorage for MemoryStorage {
    fn load(&self, key: &SketchKey) -> Result<Option<Vec<u8>>, SketchError> {
        Ok(self.payloads.get(key).map(|payload| payload.value().clone()))
    }

    fn save(&self, key: &SketchKey, payload: Vec<u8>) -> Result<(), SketchError> {
        self.payloads.insert(key.clone(), payload);
        Ok(())
    }

    fn keys(&self, metric: &str) -> Result<Vec<SketchKey>, SketchError> {
        Ok(self
            .payloads
            .iter()
            .filter(|entry| entry.key().metric == metric)
            .map(|entry| entry.key().clone())
            .collect())
    }
}

#[derive(Debug)]
struct Entry<T> {
    sketch: T,
    dirty: bool,
}

/// One exclusively-owned accumulator per [`SketchKey`], backed by a [`SketchStorage`].
pub struct SketchStore<T: Sketch, S: SketchStorage> {
    config: T::Config,
    storage: S,
    entries: DashMap<SketchKey, Entry<T>>,
}

impl<T: Sketch, S: SketchStorage> SketchStore<T, S> {
    /// Fails with `InvalidParameter` if `config` cannot build a sketch.
    pub fn new(config: T::Config, storage: S) -> Result<Self, SketchError> {
        T::zero(&config)?;
        Ok(Self {
            config,
            storage,
            entries: DashMap::new(),
        })
    }

    pub fn config(&self) -> &T::Config {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Number of accumulators held in memory.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reads a persisted sketch, rejecting one built with a different configuration.
    fn load(&self, key: &SketchKey) -> Result<Option<T>, SketchError> {
        let Some(payload) = self.storage.load(key)? else {
            return Ok(None);
        };
        let sketch = T::from_bytes(&payload)?;
        if sketch.config() != self.config {
            tracing::warn!(%key, kind = %T::KIND, "stored sketch has a different configuration");
            return Err(SketchError::ParameterMismatch(format!(
                "stored {} for {} was built with {:?}, store expects {:?}",
                T::KIND,
                key,
                sketch.config(),
                self.config
            )));
        }
        Ok(Some(sketch))
    }

    fn open(&self, key: &SketchKey) -> Result<T, SketchError> {
        match self.load(key)? {
            Some(sketch) => {
                tracing::debug!(%key, kind = %T::KIND, "reloaded accumulator");
                Ok(sketch)
            }
            None => {
                tracing::debug!(%key, kind = %T::KIND, "created accumulator");
                T::zero(&self.config)
            }
        }
    }

    /// Runs `f` against the accumulator for `key`, creating it first if needed.
    pub fn update<R>(&self, key: &SketchKey, f: impl FnOnce(&mut T) -> R) -> Result<R, SketchError> {
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.dirty = true;
            return Ok(f(&mut entry.sketch));
        }

        // Storage is read without holding a shard lock.
        let sketch = self.open(key)?;
        let mut entry = self
            .entries
            .entry(key.clone())
            .or_insert(Entry {
                sketch,
                dirty: false,
            });
        entry.dirty = true;
        Ok(f(&mut entry.sketch))
    }

    /// Merges a partial result into the accumulator for `key`.
    pub fn merge_into(&self, key: &SketchKey, partial: &T) -> Result<(), SketchError> {
        self.update(key, |sketch| sketch.merge(partial))?
    }

    /// Current value for `key`: the in-memory accumulator if held, otherwise the persisted one.
    pub fn snapshot(&self, key: &SketchKey) -> Result<Option<T>, SketchError> {
        if let Some(entry) = self.entries.get(key) {
            return Ok(Some(entry.sketch.clone()));
        }
        self.load(key)
    }

    /// Writes every dirty accumulator to storage. Returns the number written.
    pub fn flush(&self) -> Result<usize, SketchError> {
        let mut written = 0;
        for mut entry in self.entries.iter_mut() {
            if !entry.dirty {
                continue;
            }
            let payload = entry.sketch.to_bytes()?;
            self.storage.save(entry.key(), payload)?;
            entry.dirty = false;
            written += 1;
        }
        tracing::debug!(written, kind = %T::KIND, "flushed accumulators");
        Ok(written)
    }

    /// Drops the in-memory accumulator for `key`, persisting it first if dirty.
    pub fn evict(&self, key: &SketchKey) -> Result<Option<T>, SketchError> {
        let Some((key, entry)) = self.entries.remove(key) else {
            return Ok(None);
        };
        if entry.dirty {
            if let Err(e) = entry.sketch.to_bytes().and_then(|p| self.storage.save(&key, p)) {
                // Put it back so the data is not lost.
                self.entries.insert(key, entry);
                return Err(e);
            }
        }
        Ok(Some(entry.sketch))
    }

    /// Every key for `metric`, in memory or in storage.
    pub fn keys(&self, metric: &str) -> Result<BTreeSet<SketchKey>, SketchError> {
        let mut keys: BTreeSet<SketchKey> = self.storage.keys(metric)?.into_iter().collect();
        keys.extend(
            self.entries
                .iter()
                .filter(|entry| entry.key().metric == metric)
                .map(|entry| entry.key().clone()),
        );
        Ok(keys)
    }

    /// Folds the listed buckets of one metric and system. Missing buckets are skipped.
    pub fn rollup(&self, metric: &str, system: &str, buckets: &[String]) -> Result<T, SketchError> {
        let mut parts = Vec::with_capacity(buckets.len());
        for bucket in buckets {
            if let Some(sketch) = self.snapshot(&SketchKey::new(metric, system, bucket.as_str()))? {
                parts.push(sketch);
            }
        }
        fold_sequence(&self.config, &parts)
    }

    /// Folds one bucket of a metric across systems.
    pub fn rollup_systems(
        &self,
        metric: &str,
        systems: &[&str],
        bucket: &str,
    ) -> Result<T, SketchError> {
        let mut parts = Vec::with_capacity(systems.len());
        for system in systems {
            if let Some(sketch) = self.snapshot(&SketchKey::new(metric, *system, bucket))? {
                parts.push(sketch);
            }
        }
        fold_sequence(&self.config, &parts)
    }

    /// Every accumulator for `metric` as `system -> bucket -> sketch`, ready for
    /// [`CompositeRollup`](crate::aggregation::CompositeRollup).
    pub fn collect(&self, metric: &str) -> Result<BTreeMap<String, BTreeMap<String, T>>, SketchError> {
        let mut nested: BTreeMap<String, BTreeMap<String, T>> = BTreeMap::new();
        for key in self.keys(metric)? {
            if let Some(sketch) = self.snapshot(&key)? {
                nested
                    .entry(key.system)
                    .or_default()
                    .insert(key.bucket, sketch);
            }
        }
        Ok(nested)
    }
}

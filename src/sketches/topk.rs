// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::enums::SketchKind;
use crate::sketches::count_min_sketch::{CountMinConfig, CountMinSketch};
use crate::sketches::space_saving::{Counter, SpaceSaving, SpaceSavingConfig};
use crate::traits::{Mergeable, Sketch, SketchError};
use serde::{Deserialize, Serialize};

/// Construction parameters for [`TopK`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopKConfig {
    pub k: usize,
    pub depth: usize,
    pub width: usize,
    #[serde(default)]
    pub seed: u64,
}

impl Default for TopKConfig {
    fn default() -> Self {
        Self {
            k: 100,
            depth: 5,
            width: 1000,
            seed: 0,
        }
    }
}

impl TopKConfig {
    pub fn new(k: usize, depth: usize, width: usize) -> Result<Self, SketchError> {
        let config = Self {
            k,
            depth,
            width,
            seed: 0,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SketchError> {
        self.hitters().validate()?;
        self.sketch().validate()
    }

    fn hitters(&self) -> SpaceSavingConfig {
        SpaceSavingConfig { capacity: self.k }
    }

    fn sketch(&self) -> CountMinConfig {
        CountMinConfig {
            depth: self.depth,
            width: self.width,
            seed: self.seed,
        }
    }
}

/// TopK - Heavy Hitters Backed by a Count-Min Sketch
///
/// Pairs a [`SpaceSaving`] tracker with a [`CountMinSketch`] over the same stream. The
/// tracker decides *which* items are heavy; the sketch tightens their counts, since both
/// only ever overestimate and the smaller of the two is still an upper bound.
///
/// Both halves merge under their own rules, so the pair inherits their laws.
///
/// # Example
///
/// ```
/// use stream_sketches::{Mergeable, TopK, TopKConfig};
///
/// let mut topk = TopK::zero(&TopKConfig::new(3, 5, 100).unwrap()).unwrap();
/// topk.add("apple", 10);
/// topk.add("banana", 20);
/// topk.add("cherry", 5);
///
/// let top = topk.top(2);
/// assert_eq!(top[0].0, "banana");
/// assert_eq!(top[1].0, "apple");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopK {
    sketch: CountMinSketch,
    hitters: SpaceSaving,
}

impl TopK {
    pub fn new(config: TopKConfig) -> Result<Self, SketchError> {
        Ok(Self {
            sketch: CountMinSketch::new(config.sketch())?,
            hitters: SpaceSaving::new(config.hitters())?,
        })
    }

    pub fn k(&self) -> usize {
        self.hitters.capacity()
    }

    pub fn add(&mut self, item: &str, weight: u64) {
        self.sketch.add(item, weight);
        self.hitters.add(item, weight);
    }

    /// Tightest available upper bound on the frequency of `item`.
    pub fn estimate(&self, item: &str) -> u64 {
        let sketched = self.sketch.estimate(item);
        match self.hitters.estimate(item) {
            Some(tracked) => tracked.min(sketched),
            None => sketched,
        }
    }

    /// The `n` heaviest tracked items with their tightened counts.
    ///
    /// Ranked like [`SpaceSaving::top`] on the tightened counts: ties go to the
    /// earlier-inserted item, then the smaller key.
    pub fn top(&self, n: usize) -> Vec<(String, u64)> {
        let tightened: Vec<Counter> = self
            .hitters
            .entries()
            .iter()
            .map(|c| Counter {
                item: c.item.clone(),
                count: c.count.min(self.sketch.estimate(c.item.as_str())),
                error: c.error,
            })
            .collect();
        SpaceSaving::ranked_indices(&tightened)
            .into_iter()
            .take(n)
            .map(|i| (tightened[i].item.clone(), tightened[i].count))
            .collect()
    }

    pub fn sketch(&self) -> &CountMinSketch {
        &self.sketch
    }

    pub fn hitters(&self) -> &SpaceSaving {
        &self.hitters
    }
}

impl Mergeable for TopK {
    type Config = TopKConfig;

    fn zero(config: &Self::Config) -> Result<Self, SketchError> {
        Self::new(*config)
    }

    fn config(&self) -> Self::Config {
        let sketch = self.sketch.config();
        TopKConfig {
            k: self.hitters.capacity(),
            depth: sketch.depth,
            width: sketch.width,
            seed: sketch.seed,
        }
    }

    fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        // Merge into a copy of the tracker first so a failure leaves `self` whole.
        let hitters = self.hitters.combine(&other.hitters)?;
        self.sketch.merge(&other.sketch)?;
        self.hitters = hitters;
        Ok(())
    }
}

impl Sketch for TopK {
    const KIND: SketchKind = SketchKind::TopK;

    fn validate(&self) -> Result<(), SketchError> {
        self.sketch.validate()?;
        self.hitters.validate()
    }

    fn is_empty(&self) -> bool {
        self.sketch.is_empty() && self.hitters.is_empty()
    }
}

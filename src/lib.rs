// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

//! # stream-sketches
//!
//! Fixed-memory probabilistic sketches for high-volume event streams (distinct counts,
//! set membership, heavy hitters, statistical moments) and the algebra that rolls partial
//! results up across time windows, source systems and parallel workers.
//!
//! Every sketch implements [`Mergeable`]: an identity built from its configuration and an
//! associative, non-mutating `combine`. The [`aggregation`] folds work over any such type.

pub mod aggregation;
pub mod bridge;
pub mod codec;
pub mod compaction;
pub mod config;
pub mod enums;
pub mod monoids;
pub mod sketches;
pub mod store;
pub mod traits;
pub mod window;

// Re-export core traits
pub use traits::{Mergeable, Sketch, SketchError};

pub use aggregation::{Aggregator, CompositeRollup, LenientFold};
pub use bridge::SketchBridge;
pub use config::SketchSettings;
pub use enums::SketchKind;
pub use monoids::{Max, Min};
pub use sketches::{
    BloomFilter, BloomFilterConfig, BloomIntersection, CountMinConfig, CountMinSketch, Counter,
    HyperLogLog, HyperLogLogConfig, Moments, SpaceSaving, SpaceSavingConfig, TopK, TopKConfig,
};
pub use store::{MemoryStorage, SketchKey, SketchStorage, SketchStore};
pub use window::TimeWindow;

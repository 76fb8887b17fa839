// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

//! Sketch Compaction Module
//!
//! Folds many stored states of one sketch kind into a single state, e.g. collapsing 24 hourly
//! payloads into one daily payload before archiving them.
//!
//! # Two Compaction Pathways
//!
//! - **JSON Compaction**: For JSON-speaking APIs and storage systems.
//! - **Binary Compaction**: Directly over framed payloads, without a JSON detour.
//!
//! # Example
//!
//! ```
//! use stream_sketches::compaction::compact_bytes;
//! use stream_sketches::enums::SketchKind;
//! use stream_sketches::{CountMinConfig, CountMinSketch, Mergeable, Sketch};
//!
//! let config = CountMinConfig::new(4, 64).unwrap();
//! let mut morning = CountMinSketch::zero(&config).unwrap();
//! morning.add("login", 3);
//! let mut evening = CountMinSketch::zero(&config).unwrap();
//! evening.add("login", 2);
//!
//! let day = compact_bytes(
//!     SketchKind::CountMinSketch,
//!     &[&morning.to_bytes().unwrap(), &evening.to_bytes().unwrap()],
//! )
//! .unwrap();
//! assert_eq!(CountMinSketch::from_bytes(&day).unwrap().estimate("login"), 5);
//! ```

use crate::bridge::{with_sketch_type, SketchBridge};
use crate::enums::SketchKind;
use crate::sketches::{BloomFilter, CountMinSketch, HyperLogLog, Moments, SpaceSaving, TopK};
use crate::traits::{Sketch, SketchError};
use serde_json::Value;

/// Compacts several JSON states of one kind into a single merged state.
pub fn compact_json_values(kind: SketchKind, values: &[Value]) -> Result<Value, SketchError> {
    SketchBridge::merge_json_values(kind, values)
}

fn compact<T: Sketch>(buffers: &[&[u8]]) -> Result<Vec<u8>, SketchError> {
    let Some((first, rest)) = buffers.split_first() else {
        return Ok(Vec::new());
    };
    let mut merged = T::from_bytes(first)?;
    for buffer in rest {
        merged.merge(&T::from_bytes(buffer)?)?;
    }
    tracing::debug!(kind = %T::KIND, inputs = buffers.len(), "compacted payloads");
    merged.to_bytes()
}

/// Compacts several binary payloads of `kind` into one payload.
///
/// An empty input yields an empty buffer. A payload tagged with another kind fails with
/// `Deserialization`; incompatible parameters fail with `ParameterMismatch`.
pub fn compact_bytes(kind: SketchKind, buffers: &[&[u8]]) -> Result<Vec<u8>, SketchError> {
    with_sketch_type!(kind, T => compact::<T>(buffers))
}

/// Like [`compact_bytes`], reading the kind from the first payload's tag.
pub fn compact_payloads(buffers: &[&[u8]]) -> Result<Vec<u8>, SketchError> {
    match buffers.first() {
        None => Ok(Vec::new()),
        Some(first) => compact_bytes(SketchKind::of_payload(first)?, buffers),
    }
}

// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::enums::SketchKind;
use crate::sketches::{BloomFilter, CountMinSketch, HyperLogLog, Moments, SpaceSaving, TopK};
use crate::traits::{Mergeable, Sketch, SketchError};
use serde_json::Value;

/// Expands `$body` once per sketch kind with `$T` bound to the concrete type.
macro_rules! with_sketch_type {
    ($kind:expr, $T:ident => $body:expr) => {
        match $kind {
            SketchKind::HyperLogLog => {
                type $T = HyperLogLog;
                $body
            }
            SketchKind::BloomFilter => {
                type $T = BloomFilter;
                $body
            }
            SketchKind::CountMinSketch => {
                type $T = CountMinSketch;
                $body
            }
            SketchKind::SpaceSaving => {
                type $T = SpaceSaving;
                $body
            }
            SketchKind::TopK => {
                type $T = TopK;
                $body
            }
            SketchKind::Moments => {
                type $T = Moments;
                $body
            }
        }
    };
}

pub(crate) use with_sketch_type;

/// A bridge between JSON sketch states and the framed binary payloads.
///
/// This lets JSON-speaking systems hand sketches to the persistence collaborator through the
/// same validated path as native callers: every state is parsed into its concrete type and
/// checked with [`Sketch::validate`] before it is encoded or merged.
///
/// # Example
///
/// ```
/// use stream_sketches::bridge::SketchBridge;
/// use stream_sketches::enums::SketchKind;
/// use serde_json::json;
///
/// let state = json!({"count": 2, "mean": 1.5, "m2": 0.5, "m3": 0.0, "m4": 0.125});
/// let bytes = SketchBridge::json_to_bytes(SketchKind::Moments, state.clone()).unwrap();
/// assert_eq!(bytes[0], SketchKind::Moments.tag());
///
/// let back = SketchBridge::bytes_to_json(SketchKind::Moments, &bytes).unwrap();
/// assert_eq!(back, state);
/// ```
pub struct SketchBridge;

impl SketchBridge {
    fn parse<T: Sketch>(value: Value) -> Result<T, SketchError> {
        let sketch: T = serde_json::from_value(value)
            .map_err(|e| SketchError::InvalidInput(format!("JSON parse error: {}", e)))?;
        sketch.validate()?;
        Ok(sketch)
    }

    fn render<T: Sketch>(sketch: &T) -> Result<Value, SketchError> {
        serde_json::to_value(sketch).map_err(|e| SketchError::Serialization(e.to_string()))
    }

    fn merge_values<T: Sketch>(values: &[Value]) -> Result<Value, SketchError> {
        let Some((first, rest)) = values.split_first() else {
            return Ok(Value::Null);
        };
        let mut merged: T = Self::parse(first.clone())?;
        for value in rest {
            let other: T = Self::parse(value.clone())?;
            merged.merge(&other)?;
        }
        tracing::debug!(kind = %T::KIND, inputs = values.len(), "merged JSON states");
        Self::render(&merged)
    }

    /// Converts a JSON state to a framed binary payload.
    pub fn json_to_bytes(kind: SketchKind, json_value: Value) -> Result<Vec<u8>, SketchError> {
        with_sketch_type!(kind, T => Self::parse::<T>(json_value)?.to_bytes())
    }

    /// Validates a JSON state against the sketch's internal rules.
    pub fn validate_json(kind: SketchKind, json_value: Value) -> Result<(), SketchError> {
        with_sketch_type!(kind, T => Self::parse::<T>(json_value).map(|_| ()))
    }

    /// Converts a framed binary payload back to its JSON state.
    pub fn bytes_to_json(kind: SketchKind, bytes: &[u8]) -> Result<Value, SketchError> {
        with_sketch_type!(kind, T => Self::render(&T::from_bytes(bytes)?))
    }

    /// Merges several JSON states of one kind into one. An empty slice yields `null`.
    pub fn merge_json_values(kind: SketchKind, values: &[Value]) -> Result<Value, SketchError> {
        with_sketch_type!(kind, T => Self::merge_values::<T>(values))
    }

    /// JSON state of the identity element built from a JSON config.
    pub fn zero_json(kind: SketchKind, config: Value) -> Result<Value, SketchError> {
        with_sketch_type!(kind, T => {
            let config: <T as Mergeable>::Config = serde_json::from_value(config)
                .map_err(|e| SketchError::InvalidParameter(format!("{} config: {}", kind, e)))?;
            Self::render(&T::zero(&config)?)
        })
    }
}

// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::codec;
use crate::enums::SketchKind;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use thiserror::Error;

/// Error type for sketch construction, merging and decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SketchError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Parameter mismatch: {0}")]
    ParameterMismatch(String),
    #[error("Insufficient data: {0}")]
    InsufficientData(String),
    #[error("Deserialization error: {0}")]
    Deserialization(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SketchError {
    /// Stable short name of the error kind, suitable for surfacing to operators.
    pub fn kind(&self) -> &'static str {
        match self {
            SketchError::InvalidParameter(_) => "invalid_parameter",
            SketchError::ParameterMismatch(_) => "parameter_mismatch",
            SketchError::InsufficientData(_) => "insufficient_data",
            SketchError::Deserialization(_) => "deserialization",
            SketchError::Serialization(_) => "serialization",
            SketchError::InvalidInput(_) => "invalid_input",
        }
    }
}

/// Merge contract - the monoid every sketch in this crate satisfies.
///
/// A type is mergeable when it has an identity element built from its
/// configuration and an associative combine. Implementations must satisfy:
///
/// - **Left identity**: `zero(x.config()).combine(x) == x`
/// - **Right identity**: `x.combine(zero(x.config())) == x`
/// - **Associativity**: `a.combine(b).combine(c) == a.combine(b.combine(c))`
///
/// The laws hold exactly for the integer-valued sketches and within
/// floating-point tolerance for [`Moments`](crate::Moments).
///
/// Combining values built from incompatible configurations fails with
/// [`SketchError::ParameterMismatch`]; no partial merge is ever attempted.
pub trait Mergeable: Clone + Sized {
    /// Construction parameters. Two values can only be combined when their
    /// configurations are compatible.
    type Config: Clone + Debug + PartialEq + Send + Sync;

    /// Identity element for the given configuration.
    fn zero(config: &Self::Config) -> Result<Self, SketchError>;

    /// Configuration this value was built with.
    fn config(&self) -> Self::Config;

    /// Merges `other` into `self` in place.
    ///
    /// On error `self` is left untouched.
    fn merge(&mut self, other: &Self) -> Result<(), SketchError>;

    /// Pure combine: neither operand is mutated.
    fn combine(&self, other: &Self) -> Result<Self, SketchError> {
        let mut merged = self.clone();
        merged.merge(other)?;
        Ok(merged)
    }
}

/// A mergeable sketch that can be persisted as a self-describing payload.
///
/// Payloads are framed as `[format tag][version][body]` so the storage
/// collaborator can hold them without knowing anything about their layout.
pub trait Sketch: Mergeable + Serialize + DeserializeOwned + Debug + Send + Sync {
    /// Format tag written into every payload of this type.
    const KIND: SketchKind;

    /// Validates the internal consistency of the sketch state.
    fn validate(&self) -> Result<(), SketchError>;

    /// Returns true if the sketch has observed nothing.
    fn is_empty(&self) -> bool;

    /// Serializes the sketch into a framed payload.
    fn to_bytes(&self) -> Result<Vec<u8>, SketchError> {
        codec::encode(Self::KIND, self)
    }

    /// Reconstructs a sketch from a framed payload.
    ///
    /// A payload that decodes but describes an inconsistent sketch is
    /// reported as a deserialization error, never returned.
    fn from_bytes(bytes: &[u8]) -> Result<Self, SketchError> {
        let sketch: Self = codec::decode(Self::KIND, bytes)?;
        sketch
            .validate()
            .map_err(|e| SketchError::Deserialization(e.to_string()))?;
        Ok(sketch)
    }
}

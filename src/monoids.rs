// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

//! Basic Monoids
//!
//! Plain values that satisfy the same [`Mergeable`] contract as the sketches, so the
//! aggregation helpers can roll up exact totals, extremes and sets next to approximate ones.
//!
//! | Type | Identity | Combine |
//! |------|----------|---------|
//! | `u64` | `0` | saturating add |
//! | `i64` | `0` | wrapping add |
//! | `f64` | `0.0` | add |
//! | [`Max<T>`] | `Max(None)` | larger value |
//! | [`Min<T>`] | `Min(None)` | smaller value |
//! | `BTreeSet<T>` | empty set | union |

use crate::traits::{Mergeable, SketchError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Debug;

impl Mergeable for u64 {
    type Config = ();

    fn zero(_config: &Self::Config) -> Result<Self, SketchError> {
        Ok(0)
    }

    fn config(&self) -> Self::Config {}

    fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        *self = self.saturating_add(*other);
        Ok(())
    }
}

impl Mergeable for i64 {
    type Config = ();

    fn zero(_config: &Self::Config) -> Result<Self, SketchError> {
        Ok(0)
    }

    fn config(&self) -> Self::Config {}

    fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        *self = self.wrapping_add(*other);
        Ok(())
    }
}

/// Floating-point addition; associative only up to rounding.
impl Mergeable for f64 {
    type Config = ();

    fn zero(_config: &Self::Config) -> Result<Self, SketchError> {
        Ok(0.0)
    }

    fn config(&self) -> Self::Config {}

    fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        *self += *other;
        Ok(())
    }
}

impl<T: Ord + Clone + Debug> Mergeable for BTreeSet<T> {
    type Config = ();

    fn zero(_config: &Self::Config) -> Result<Self, SketchError> {
        Ok(BTreeSet::new())
    }

    fn config(&self) -> Self::Config {}

    fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        self.extend(other.iter().cloned());
        Ok(())
    }
}

/// Largest value seen; `Max(None)` until the first observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Max<T>(pub Option<T>);

impl<T: Ord + Clone> Max<T> {
    pub fn of(value: T) -> Self {
        Max(Some(value))
    }

    pub fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }
}

impl<T: Ord + Clone> Mergeable for Max<T> {
    type Config = ();

    fn zero(_config: &Self::Config) -> Result<Self, SketchError> {
        Ok(Max(None))
    }

    fn config(&self) -> Self::Config {}

    fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        if let Some(theirs) = &other.0 {
            match &self.0 {
                Some(mine) if mine >= theirs => {}
                _ => self.0 = Some(theirs.clone()),
            }
        }
        Ok(())
    }
}

/// Smallest value seen; `Min(None)` until the first observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Min<T>(pub Option<T>);

impl<T: Ord + Clone> Min<T> {
    pub fn of(value: T) -> Self {
        Min(Some(value))
    }

    pub fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }
}

impl<T: Ord + Clone> Mergeable for Min<T> {
    type Config = ();

    fn zero(_config: &Self::Config) -> Result<Self, SketchError> {
        Ok(Min(None))
    }

    fn config(&self) -> Self::Config {}

    fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        if let Some(theirs) = &other.0 {
            match &self.0 {
                Some(mine) if mine <= theirs => {}
                _ => self.0 = Some(theirs.clone()),
            }
        }
        Ok(())
    }
}

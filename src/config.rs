// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

//! Service-wide sketch defaults.
//!
//! Loaded from environment variables (absent ones take defaults) or from JSON. A value that is
//! present but malformed is an error rather than a silent fallback.

use crate::sketches::{
    BloomFilterConfig, CountMinConfig, HyperLogLogConfig, SpaceSavingConfig, TopKConfig,
};
use crate::traits::SketchError;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Default parameters for every sketch the surrounding service creates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SketchSettings {
    pub hll_precision: u8,
    pub bloom_capacity: u64,
    pub bloom_error_rate: f64,
    pub cms_width: usize,
    pub cms_depth: usize,
    pub topk_capacity: usize,
}

impl Default for SketchSettings {
    fn default() -> Self {
        Self {
            hll_precision: 14,
            bloom_capacity: 1_000_000,
            bloom_error_rate: 0.001,
            cms_width: 1000,
            cms_depth: 5,
            topk_capacity: 100,
        }
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, SketchError>
where
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e| {
            SketchError::InvalidParameter(format!("{}={:?}: {}", name, raw, e))
        }),
    }
}

impl SketchSettings {
    /// Load settings from environment variables
    ///
    /// Environment variables:
    /// - `SKETCH_HLL_PRECISION` (default: 14)
    /// - `SKETCH_BLOOM_CAPACITY` (default: 1000000)
    /// - `SKETCH_BLOOM_ERROR_RATE` (default: 0.001)
    /// - `SKETCH_CMS_WIDTH` (default: 1000)
    /// - `SKETCH_CMS_DEPTH` (default: 5)
    /// - `SKETCH_TOPK_CAPACITY` (default: 100)
    pub fn from_env() -> Result<Self, SketchError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SketchError> {
        let defaults = Self::default();
        let settings = Self {
            hll_precision: parse_var(&lookup, "SKETCH_HLL_PRECISION", defaults.hll_precision)?,
            bloom_capacity: parse_var(&lookup, "SKETCH_BLOOM_CAPACITY", defaults.bloom_capacity)?,
            bloom_error_rate: parse_var(
                &lookup,
                "SKETCH_BLOOM_ERROR_RATE",
                defaults.bloom_error_rate,
            )?,
            cms_width: parse_var(&lookup, "SKETCH_CMS_WIDTH", defaults.cms_width)?,
            cms_depth: parse_var(&lookup, "SKETCH_CMS_DEPTH", defaults.cms_depth)?,
            topk_capacity: parse_var(&lookup, "SKETCH_TOPK_CAPACITY", defaults.topk_capacity)?,
        };
        settings.validate()?;
        tracing::debug!(?settings, "loaded sketch settings");
        Ok(settings)
    }

    pub fn from_json(json: &str) -> Result<Self, SketchError> {
        let settings: Self = serde_json::from_str(json)
            .map_err(|e| SketchError::InvalidParameter(format!("sketch settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SketchError> {
        self.hyperloglog().validate()?;
        self.bloom_filter().validate()?;
        self.count_min().validate()?;
        self.top_k().validate()
    }

    pub fn hyperloglog(&self) -> HyperLogLogConfig {
        HyperLogLogConfig {
            precision: self.hll_precision,
            seed: 0,
        }
    }

    pub fn bloom_filter(&self) -> BloomFilterConfig {
        BloomFilterConfig {
            capacity: self.bloom_capacity,
            error_rate: self.bloom_error_rate,
        }
    }

    pub fn count_min(&self) -> CountMinConfig {
        CountMinConfig {
            depth: self.cms_depth,
            width: self.cms_width,
            seed: 0,
        }
    }

    pub fn space_saving(&self) -> SpaceSavingConfig {
        SpaceSavingConfig {
            capacity: self.topk_capacity,
        }
    }

    pub fn top_k(&self) -> TopKConfig {
        TopKConfig {
            k: self.topk_capacity,
            depth: self.cms_depth,
            width: self.cms_width,
            seed: 0,
        }
    }
}

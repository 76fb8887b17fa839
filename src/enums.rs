// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::codec;
use crate::traits::SketchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Enumeration of supported sketch payload types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SketchKind {
    HyperLogLog,
    BloomFilter,
    CountMinSketch,
    SpaceSaving,
    TopK,
    Moments,
}

impl SketchKind {
    pub const ALL: [SketchKind; 6] = [
        SketchKind::HyperLogLog,
        SketchKind::BloomFilter,
        SketchKind::CountMinSketch,
        SketchKind::SpaceSaving,
        SketchKind::TopK,
        SketchKind::Moments,
    ];

    /// Format tag byte leading every payload of this kind.
    pub fn tag(self) -> u8 {
        match self {
            SketchKind::HyperLogLog => 1,
            SketchKind::BloomFilter => 2,
            SketchKind::CountMinSketch => 3,
            SketchKind::SpaceSaving => 4,
            SketchKind::TopK => 5,
            SketchKind::Moments => 6,
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self, SketchError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.tag() == tag)
            .ok_or_else(|| SketchError::Deserialization(format!("unknown format tag: {}", tag)))
    }

    /// Reads the kind of a serialized payload from its header.
    pub fn of_payload(bytes: &[u8]) -> Result<Self, SketchError> {
        codec::split_header(bytes).map(|(kind, _, _)| kind)
    }
}

impl fmt::Display for SketchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SketchKind::HyperLogLog => write!(f, "HyperLogLog"),
            SketchKind::BloomFilter => write!(f, "BloomFilter"),
            SketchKind::CountMinSketch => write!(f, "CountMinSketch"),
            SketchKind::SpaceSaving => write!(f, "SpaceSaving"),
            SketchKind::TopK => write!(f, "TopK"),
            SketchKind::Moments => write!(f, "Moments"),
        }
    }
}

impl FromStr for SketchKind {
    type Err = SketchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('_', "").to_lowercase().as_str() {
            "hyperloglog" | "hll" => Ok(SketchKind::HyperLogLog),
            "bloomfilter" | "bloom" => Ok(SketchKind::BloomFilter),
            "countminsketch" | "cms" => Ok(SketchKind::CountMinSketch),
            "spacesaving" => Ok(SketchKind::SpaceSaving),
            "topk" => Ok(SketchKind::TopK),
            "moments" => Ok(SketchKind::Moments),
            _ => Err(SketchError::InvalidInput(format!("Unknown sketch type: {}", s))),
        }
    }
}

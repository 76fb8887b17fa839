// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

//! Probabilistic Data Structures (Sketches)
//!
//! These data structures provide approximate answers to queries (cardinality, membership,
//! frequency, heavy hitters, moments) in fixed memory. Every sketch satisfies the
//! [`Mergeable`](crate::Mergeable) contract, so partial results from time windows, systems or
//! workers combine without reprocessing raw events.

pub mod bloom_filter;
pub mod count_min_sketch;
pub mod hyperloglog;
pub mod moments;
pub mod space_saving;
pub mod topk;

pub use bloom_filter::{BloomFilter, BloomFilterConfig, BloomIntersection};
pub use count_min_sketch::{CountMinConfig, CountMinSketch};
pub use hyperloglog::{HyperLogLog, HyperLogLogConfig};
pub use moments::Moments;
pub use space_saving::{Counter, SpaceSaving, SpaceSavingConfig};
pub use topk::{TopK, TopKConfig};

use siphasher::sip::SipHasher13;
use siphasher::sip128::{Hasher128, SipHasher13 as SipHasher13x128};
use std::hash::{Hash, Hasher};

/// 64-bit SipHash-1-3 of an item, keyed by `seed`.
pub(crate) fn hash64<T: Hash + ?Sized>(seed: u64, item: &T) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(seed, 0);
    item.hash(&mut hasher);
    hasher.finish()
}

/// Two independent 64-bit hashes taken from one 128-bit SipHash-1-3 pass.
pub(crate) fn hash128<T: Hash + ?Sized>(seed: u64, item: &T) -> (u64, u64) {
    let mut hasher = SipHasher13x128::new_with_keys(seed, 0);
    item.hash(&mut hasher);
    let hash = hasher.finish128();
    (hash.h1, hash.h2)
}

/// Kirsch-Mitzenmacher double hashing: position `i` of `count` in `[0, modulus)`.
///
/// The step is never a multiple of `modulus`, so the positions cannot all collapse onto `h1`.
pub(crate) fn double_hash_positions(
    (h1, h2): (u64, u64),
    count: u64,
    modulus: u64,
) -> impl Iterator<Item = u64> {
    let modulus = u128::from(modulus.max(1));
    let start = u128::from(h1) % modulus;
    let step = match u128::from(h2) % modulus {
        0 => 1,
        step => step,
    };
    (0..count).map(move |i| ((start + u128::from(i) * step) % modulus) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_seeded() {
        assert_eq!(hash64(0, "apple"), hash64(0, "apple"));
        assert_ne!(hash64(0, "apple"), hash64(1, "apple"));
        let (h1, h2) = hash128(0, "apple");
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_step_multiple_of_modulus_still_spreads() {
        // h2 = 3 * 13 would otherwise pin every position to h1 % 13.
        let positions: Vec<u64> = double_hash_positions((5, 39), 4, 13).collect();
        assert_eq!(positions, vec![5, 6, 7, 8]);
        let zero_step: Vec<u64> = double_hash_positions((5, 0), 3, 13).collect();
        assert_eq!(zero_step, vec![5, 6, 7]);
    }

    #[test]
    fn test_positions_stay_in_range() {
        let positions: Vec<u64> = double_hash_positions(hash128(7, &42u64), 10, 13).collect();
        assert_eq!(positions.len(), 10);
        assert!(positions.iter().all(|&p| p < 13));
    }
}

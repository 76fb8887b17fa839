// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use stream_sketches::codec::FORMAT_VERSION;
use stream_sketches::*;

fn hll(precision: u8, seed: u64) -> HyperLogLog {
    HyperLogLog::zero(&HyperLogLogConfig::new(precision).unwrap().with_seed(seed)).unwrap()
}

// ============================================================================
// Cardinality
// ============================================================================

#[test]
fn test_disjoint_union_estimate() {
    let mut estimates = Vec::new();
    for seed in 0..16 {
        let mut left = hll(10, seed);
        let mut right = hll(10, seed);
        for i in 0..1000 {
            left.add(&format!("left-{}", i));
            right.add(&format!("right-{}", i));
        }
        let union = left.combine(&right).unwrap();
        let estimate = union.estimate();
        assert!(
            (estimate - 2000.0).abs() / 2000.0 <= 0.15,
            "seed {} estimate {}",
            seed,
            estimate
        );
        estimates.push(estimate);
    }
    let mean = estimates.iter().sum::<f64>() / estimates.len() as f64;
    assert!((mean - 2000.0).abs() / 2000.0 <= 0.05, "mean estimate {}", mean);
}

#[test]
fn test_cardinality_accuracy_at_default_precision() {
    const N: u64 = 100_000;
    let bound = 3.0 * 1.04 / (16384f64).sqrt();
    let trials = 20;
    let mut within = 0;
    for seed in 0..trials {
        let mut sketch = hll(14, seed);
        for i in 0..N {
            sketch.add(&i);
        }
        let error = (sketch.estimate() - N as f64).abs() / N as f64;
        if error <= bound {
            within += 1;
        }
    }
    assert!(within >= 19, "only {}/{} trials within {:.4}", within, trials, bound);
}

#[test]
fn test_cardinality_ignores_duplicates() {
    let mut sketch = hll(12, 0);
    for _ in 0..10 {
        for i in 0..50 {
            sketch.add(&i);
        }
    }
    let estimate = sketch.cardinality();
    assert!((48..=52).contains(&estimate), "estimate {}", estimate);
}

// ============================================================================
// Membership
// ============================================================================

#[test]
fn test_membership_half_full() {
    let mut bf = BloomFilter::zero(&BloomFilterConfig::new(1000, 0.01).unwrap()).unwrap();
    for i in 0..500 {
        bf.add(&format!("member-{}", i));
    }
    assert!((0..500).all(|i| bf.contains(&format!("member-{}", i))));

    let false_positives = (0..10_000)
        .filter(|i| bf.contains(&format!("stranger-{}", i)))
        .count();
    assert!(false_positives <= 150, "{} false positives", false_positives);
}

#[test]
fn test_membership_at_capacity_stays_near_target_rate() {
    let error_rate = 0.01;
    let mut bf = BloomFilter::zero(&BloomFilterConfig::new(1000, error_rate).unwrap()).unwrap();
    for i in 0..1000u32 {
        bf.add(&i);
    }
    assert!((0..1000u32).all(|i| bf.contains(&i)));

    let false_positives = (1_000_000..1_010_000u32).filter(|i| bf.contains(i)).count();
    let rate = false_positives as f64 / 10_000.0;
    assert!(rate <= 3.0 * error_rate, "false positive rate {}", rate);
}

#[test]
fn test_union_keeps_every_member() {
    let config = BloomFilterConfig::new(1000, 0.01).unwrap();
    let mut a = BloomFilter::zero(&config).unwrap();
    let mut b = BloomFilter::zero(&config).unwrap();
    for i in 0..300u32 {
        a.add(&i);
        b.add(&(i + 10_000));
    }
    let union = a.combine(&b).unwrap();
    assert!((0..300u32).all(|i| union.contains(&i) && union.contains(&(i + 10_000))));
    assert!(union.fill_ratio() >= a.fill_ratio());
}

// ============================================================================
// Frequency and heavy hitters
// ============================================================================

fn tracker(capacity: usize, items: &[(&str, u64)]) -> SpaceSaving {
    let mut hh = SpaceSaving::zero(&SpaceSavingConfig::new(capacity).unwrap()).unwrap();
    for (item, weight) in items {
        hh.add(item, *weight);
    }
    hh
}

#[test]
fn test_heavy_hitter_merge_scenario() {
    let x = tracker(4, &[("a", 10), ("b", 7), ("c", 5), ("d", 1)]);
    let y = tracker(4, &[("b", 5), ("e", 20)]);
    assert_eq!(x.floor(), 0);
    assert_eq!(y.floor(), 0);

    let merged = x.combine(&y).unwrap();
    assert_eq!(
        merged.top(3),
        vec![
            ("e".to_string(), 20),
            ("b".to_string(), 12),
            ("a".to_string(), 10)
        ]
    );
    // "d" was truncated away and raised the floor.
    assert_eq!(merged.len(), 4);
    assert_eq!(merged.estimate("d"), None);
    assert_eq!(merged.floor(), 1);
}

#[test]
fn test_one_sided_items_absorb_opponent_floor() {
    let x = tracker(3, &[("a", 10)]);
    // Evicts "r" (1) and then "q" (2), so anything y does not track occurred at most twice.
    let y = tracker(3, &[("p", 6), ("q", 2), ("r", 1), ("s", 4), ("t", 1)]);
    assert_eq!(y.floor(), 2);

    let merged = x.combine(&y).unwrap();
    assert_eq!(merged.estimate("a"), Some(12));
    assert_eq!(merged.error_bound("a"), Some(2));
    // a=12, p=6, s=5 survive; t=3 is truncated and becomes the new floor.
    assert_eq!(merged.estimate("t"), None);
    assert_eq!(merged.floor(), 3);
}

#[test]
fn test_count_min_frequency_scenario() {
    let mut cms = CountMinSketch::zero(&CountMinConfig::from_error_bounds(0.01, 0.01).unwrap()).unwrap();
    for i in 0..1000u64 {
        cms.add(&(i % 100), 1);
    }
    for i in 0..100u64 {
        let estimate = cms.estimate(&i);
        assert!(estimate >= 10);
        // Overestimate is at most epsilon * total with high probability.
        assert!(estimate <= 10 + 10 + 5, "item {} estimate {}", i, estimate);
    }
    assert_eq!(cms.total_count(), 1000);
}

#[test]
fn test_topk_detector() {
    let mut topk = TopK::zero(&TopKConfig::new(8, 4, 256).unwrap()).unwrap();
    let stream = [("home", 50), ("search", 30), ("cart", 20), ("help", 2), ("about", 1)];
    for (page, hits) in stream {
        for _ in 0..hits {
            topk.add(page, 1);
        }
    }
    let top: Vec<String> = topk.top(3).into_iter().map(|(page, _)| page).collect();
    assert_eq!(top, vec!["home", "search", "cart"]);
    assert!(topk.estimate("home") >= 50);
}

// ============================================================================
// Moments
// ============================================================================

#[test]
fn test_moments_split_scenario() {
    let left = Moments::from_values([1.0, 2.0]);
    let right = Moments::from_values([3.0, 4.0, 5.0]);
    let merged = left.combine(&right).unwrap();
    assert_eq!(merged.count(), 5);
    assert!((merged.mean().unwrap() - 3.0).abs() < 1e-12);
    assert!((merged.population_variance().unwrap() - 2.0).abs() < 1e-12);
    assert!((merged.sample_variance().unwrap() - 2.5).abs() < 1e-12);
    assert!(merged.skewness().unwrap().abs() < 1e-12);
    // Discrete uniform on five points: excess kurtosis -1.3.
    assert!((merged.kurtosis().unwrap() + 1.3).abs() < 1e-9);
}

#[test]
fn test_moments_uneven_partitions() {
    let big = Moments::from_values((0..100_000).map(|i| 1e6 + (i % 10) as f64));
    let small = Moments::from_value(1e6 + 100.0);
    let merged = big.combine(&small).unwrap();
    let whole = Moments::from_values(
        (0..100_000)
            .map(|i| 1e6 + (i % 10) as f64)
            .chain(std::iter::once(1e6 + 100.0)),
    );
    let (a, b) = (merged.population_variance().unwrap(), whole.population_variance().unwrap());
    assert!((a - b).abs() <= 1e-6 * b, "{} vs {}", a, b);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_invalid_parameters() {
    assert!(matches!(HyperLogLogConfig::new(17), Err(SketchError::InvalidParameter(_))));
    assert!(matches!(BloomFilterConfig::new(100, 1.5), Err(SketchError::InvalidParameter(_))));
    assert!(matches!(CountMinConfig::new(0, 10), Err(SketchError::InvalidParameter(_))));
    assert!(matches!(SpaceSavingConfig::new(0), Err(SketchError::InvalidParameter(_))));
    assert!(HyperLogLog::zero(&HyperLogLogConfig { precision: 2, seed: 0 }).is_err());
}

#[test]
fn test_parameter_mismatch_never_partially_merges() {
    let mut a = hll(10, 0);
    a.add("x");
    let before = a.clone();
    let err = a.merge(&hll(12, 0)).unwrap_err();
    assert_eq!(err.kind(), "parameter_mismatch");
    assert_eq!(a, before);

    let mut hh = tracker(3, &[("a", 1)]);
    let before = hh.clone();
    assert!(hh.merge(&tracker(4, &[])).is_err());
    assert_eq!(hh, before);
}

#[test]
fn test_insufficient_data() {
    let empty = Moments::zero(&()).unwrap();
    for result in [
        empty.mean(),
        empty.population_variance(),
        empty.sample_variance(),
        empty.stddev(),
        empty.skewness(),
        empty.kurtosis(),
    ] {
        assert!(matches!(result, Err(SketchError::InsufficientData(_))));
    }
}

// ============================================================================
// Payloads
// ============================================================================

#[test]
fn test_payload_header() {
    let bytes = Moments::from_value(2.0).to_bytes().unwrap();
    assert_eq!(bytes[0], SketchKind::Moments.tag());
    assert_eq!(bytes[1], FORMAT_VERSION);
    assert_eq!(SketchKind::of_payload(&bytes).unwrap(), SketchKind::Moments);
}

#[test]
fn test_zero_sketches_roundtrip() {
    let zero = hll(8, 0);
    assert_eq!(HyperLogLog::from_bytes(&zero.to_bytes().unwrap()).unwrap(), zero);
    let zero = BloomFilter::zero(&BloomFilterConfig::new(100, 0.01).unwrap()).unwrap();
    assert_eq!(BloomFilter::from_bytes(&zero.to_bytes().unwrap()).unwrap(), zero);
    let zero = Moments::zero(&()).unwrap();
    assert_eq!(Moments::from_bytes(&zero.to_bytes().unwrap()).unwrap(), zero);
}

#[test]
fn test_malformed_payloads() {
    let mut cms = CountMinSketch::zero(&CountMinConfig::new(5, 16).unwrap()).unwrap();
    cms.add("k", 3);
    let bytes = cms.to_bytes().unwrap();

    let truncated = &bytes[..bytes.len() - 4];
    assert!(matches!(CountMinSketch::from_bytes(truncated), Err(SketchError::Deserialization(_))));

    let mut future = bytes.clone();
    future[1] = FORMAT_VERSION + 1;
    assert!(matches!(CountMinSketch::from_bytes(&future), Err(SketchError::Deserialization(_))));

    let mut unknown = bytes.clone();
    unknown[0] = 0xEE;
    assert!(matches!(CountMinSketch::from_bytes(&unknown), Err(SketchError::Deserialization(_))));

    assert!(matches!(HyperLogLog::from_bytes(&bytes), Err(SketchError::Deserialization(_))));
    assert!(matches!(CountMinSketch::from_bytes(&[]), Err(SketchError::Deserialization(_))));

    let mut suffixed = bytes.clone();
    suffixed.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
    assert!(matches!(CountMinSketch::from_bytes(&suffixed), Err(SketchError::Deserialization(_))));

    // Two payloads back to back are not one payload.
    let mut other = CountMinSketch::zero(&CountMinConfig::new(5, 16).unwrap()).unwrap();
    other.add("k", 100);
    let mut concatenated = bytes.clone();
    concatenated.extend_from_slice(&other.to_bytes().unwrap());
    assert!(matches!(
        CountMinSketch::from_bytes(&concatenated),
        Err(SketchError::Deserialization(_))
    ));

    // Depth rewritten from 5 to 4 while five rows remain: decodes, but does not validate.
    let mut inconsistent = bytes.clone();
    inconsistent[2] = 4;
    assert!(matches!(
        CountMinSketch::from_bytes(&inconsistent),
        Err(SketchError::Deserialization(_))
    ));
}

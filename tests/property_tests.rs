// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use stream_sketches::*;

// ============================================================================
// Strategies
// ============================================================================

const ITEMS: [&str; 6] = ["apple", "banana", "cherry", "date", "elder", "fig"];

fn hll_config() -> HyperLogLogConfig {
    HyperLogLogConfig::new(6).unwrap()
}

fn bloom_config() -> BloomFilterConfig {
    BloomFilterConfig::new(200, 0.05).unwrap()
}

fn cms_config() -> CountMinConfig {
    CountMinConfig::new(3, 32).unwrap()
}

fn space_saving_config() -> SpaceSavingConfig {
    SpaceSavingConfig::new(8).unwrap()
}

fn topk_config() -> TopKConfig {
    TopKConfig::new(8, 3, 32).unwrap()
}

fn arb_hll() -> impl Strategy<Value = HyperLogLog> {
    prop::collection::vec(0u32..5000, 0..60).prop_map(|items| {
        let mut hll = HyperLogLog::zero(&hll_config()).unwrap();
        for item in items {
            hll.add(&item);
        }
        hll
    })
}

fn arb_bloom() -> impl Strategy<Value = BloomFilter> {
    prop::collection::vec(0u32..5000, 0..60).prop_map(|items| {
        let mut bf = BloomFilter::zero(&bloom_config()).unwrap();
        for item in items {
            bf.add(&item);
        }
        bf
    })
}

fn arb_bloom_intersection() -> impl Strategy<Value = BloomIntersection> {
    arb_bloom().prop_map(BloomIntersection::from)
}

fn arb_weighted_items() -> impl Strategy<Value = Vec<(&'static str, u64)>> {
    prop::collection::vec((prop::sample::select(ITEMS.to_vec()), 1u64..20), 0..30)
}

fn arb_cms() -> impl Strategy<Value = CountMinSketch> {
    arb_weighted_items().prop_map(|ops| {
        let mut cms = CountMinSketch::zero(&cms_config()).unwrap();
        for (item, weight) in ops {
            cms.add(item, weight);
        }
        cms
    })
}

// The alphabet fits in the capacity, so merges never truncate.
fn arb_space_saving() -> impl Strategy<Value = SpaceSaving> {
    arb_weighted_items().prop_map(|ops| {
        let mut hh = SpaceSaving::zero(&space_saving_config()).unwrap();
        for (item, weight) in ops {
            hh.add(item, weight);
        }
        hh
    })
}

fn arb_topk() -> impl Strategy<Value = TopK> {
    arb_weighted_items().prop_map(|ops| {
        let mut topk = TopK::zero(&topk_config()).unwrap();
        for (item, weight) in ops {
            topk.add(item, weight);
        }
        topk
    })
}

fn arb_moments() -> impl Strategy<Value = Moments> {
    prop::collection::vec(-1000.0f64..1000.0, 0..30).prop_map(|values| Moments::from_values(values))
}

fn arb_set() -> impl Strategy<Value = BTreeSet<u8>> {
    prop::collection::btree_set(0u8..50, 0..10)
}

// ============================================================================
// Merge laws
// ============================================================================

macro_rules! test_laws {
    ($type:ident, $config:expr, $arb:expr) => {
        paste::paste! {
            proptest! {
                #[test]
                fn [< $type:lower _left_identity >](a in $arb) {
                    let zero = $type::zero(&$config).unwrap();
                    prop_assert_eq!(zero.combine(&a).unwrap(), a);
                }

                #[test]
                fn [< $type:lower _right_identity >](a in $arb) {
                    let zero = $type::zero(&$config).unwrap();
                    prop_assert_eq!(a.combine(&zero).unwrap(), a);
                }

                #[test]
                fn [< $type:lower _associativity >](a in $arb, b in $arb, c in $arb) {
                    let ab_c = a.combine(&b).unwrap().combine(&c).unwrap();
                    let a_bc = a.combine(&b.combine(&c).unwrap()).unwrap();
                    prop_assert_eq!(ab_c, a_bc);
                }

                #[test]
                fn [< $type:lower _combine_is_pure >](a in $arb, b in $arb) {
                    let (a0, b0) = (a.clone(), b.clone());
                    let _ = a.combine(&b).unwrap();
                    prop_assert_eq!(a, a0);
                    prop_assert_eq!(b, b0);
                }
            }
        }
    };
}

macro_rules! test_commutative {
    ($type:ident, $arb:expr) => {
        paste::paste! {
            proptest! {
                #[test]
                fn [< $type:lower _commutativity >](a in $arb, b in $arb) {
                    prop_assert_eq!(a.combine(&b).unwrap(), b.combine(&a).unwrap());
                }
            }
        }
    };
}

test_laws!(HyperLogLog, hll_config(), arb_hll());
test_laws!(BloomFilter, bloom_config(), arb_bloom());
test_laws!(CountMinSketch, cms_config(), arb_cms());
test_laws!(SpaceSaving, space_saving_config(), arb_space_saving());
test_laws!(TopK, topk_config(), arb_topk());
test_laws!(BloomIntersection, bloom_config(), arb_bloom_intersection());

test_commutative!(HyperLogLog, arb_hll());
test_commutative!(BloomFilter, arb_bloom());
test_commutative!(BloomIntersection, arb_bloom_intersection());
test_commutative!(CountMinSketch, arb_cms());

proptest! {
    #[test]
    fn bloom_intersection_keeps_common_members(
        common in prop::collection::vec(0u32..5000, 0..20),
        extras in prop::collection::vec(prop::collection::vec(5000u32..10_000, 0..20), 1..5),
    ) {
        let filters: Vec<BloomFilter> = extras
            .iter()
            .map(|extra| {
                let mut bf = BloomFilter::zero(&bloom_config()).unwrap();
                for item in common.iter().chain(extra) {
                    bf.add(item);
                }
                bf
            })
            .collect();
        let wrapped: Vec<BloomIntersection> =
            filters.iter().cloned().map(BloomIntersection::from).collect();

        let folded = aggregation::fold_sequence(&bloom_config(), &wrapped).unwrap();
        let direct = BloomIntersection::common(&bloom_config(), &filters).unwrap();
        prop_assert_eq!(folded.filter(), &direct);
        prop_assert!(common.iter().all(|item| folded.contains(item)));
    }
}

type Set = BTreeSet<u8>;
test_laws!(Set, (), arb_set());
test_commutative!(Set, arb_set());

// ============================================================================
// Moments: laws within floating-point tolerance
// ============================================================================

fn fields(m: &Moments) -> (u64, f64, f64, f64, f64) {
    let v = serde_json::to_value(m).unwrap();
    (
        v["count"].as_u64().unwrap(),
        v["mean"].as_f64().unwrap(),
        v["m2"].as_f64().unwrap(),
        v["m3"].as_f64().unwrap(),
        v["m4"].as_f64().unwrap(),
    )
}

fn close(x: f64, y: f64, scale: f64) -> bool {
    (x - y).abs() <= 1e-9 * (1.0 + x.abs().max(y.abs()).max(scale))
}

fn moments_close(a: &Moments, b: &Moments) -> bool {
    let (na, mean_a, m2_a, m3_a, m4_a) = fields(a);
    let (nb, mean_b, m2_b, m3_b, m4_b) = fields(b);
    let m2 = m2_a.max(m2_b);
    na == nb
        && close(mean_a, mean_b, 1000.0)
        && close(m2_a, m2_b, m2)
        && close(m3_a, m3_b, m2.powf(1.5))
        && close(m4_a, m4_b, m2 * m2)
}

proptest! {
    #[test]
    fn moments_identity(a in arb_moments()) {
        let zero = Moments::zero(&()).unwrap();
        prop_assert!(moments_close(&zero.combine(&a).unwrap(), &a));
        prop_assert!(moments_close(&a.combine(&zero).unwrap(), &a));
    }

    #[test]
    fn moments_associativity(a in arb_moments(), b in arb_moments(), c in arb_moments()) {
        let ab_c = a.combine(&b).unwrap().combine(&c).unwrap();
        let a_bc = a.combine(&b.combine(&c).unwrap()).unwrap();
        prop_assert!(moments_close(&ab_c, &a_bc), "{:?} vs {:?}", ab_c, a_bc);
    }

    #[test]
    fn moments_partition_matches_single_pass(
        values in prop::collection::vec(-1000.0f64..1000.0, 2..60),
        cuts in prop::collection::vec(0usize..60, 0..4),
    ) {
        let whole = Moments::from_values(values.iter().copied());

        let mut bounds: Vec<usize> = cuts.into_iter().map(|c| c % values.len()).collect();
        bounds.push(0);
        bounds.push(values.len());
        bounds.sort_unstable();
        bounds.dedup();
        let parts: Vec<Moments> = bounds
            .windows(2)
            .map(|w| Moments::from_values(values[w[0]..w[1]].iter().copied()))
            .collect();
        let merged = aggregation::fold_sequence(&(), &parts).unwrap();

        let mean = whole.mean().unwrap();
        let var = whole.population_variance().unwrap();
        prop_assert_eq!(merged.count(), whole.count());
        prop_assert!((merged.mean().unwrap() - mean).abs() <= 1e-6 * (1.0 + mean.abs()));
        prop_assert!((merged.population_variance().unwrap() - var).abs() <= 1e-6 * (1.0 + var));
    }
}

// ============================================================================
// Heavy-hitter error bound under adds and merges
// ============================================================================

fn arb_stream() -> impl Strategy<Value = Vec<(u8, u64)>> {
    prop::collection::vec((0u8..20, 1u64..10), 0..120)
}

fn check_bounds(hh: &SpaceSaving, truth: &HashMap<String, u64>) -> Result<(), TestCaseError> {
    for counter in hh.entries() {
        let actual = truth.get(&counter.item).copied().unwrap_or(0);
        prop_assert!(actual <= counter.count, "{} true {} > {}", counter.item, actual, counter.count);
        prop_assert!(
            counter.count - counter.error <= actual,
            "{} true {} < {} - {}",
            counter.item,
            actual,
            counter.count,
            counter.error
        );
    }
    for (item, &actual) in truth {
        if hh.estimate(item).is_none() {
            prop_assert!(actual <= hh.floor(), "untracked {} true {} > floor {}", item, actual, hh.floor());
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn space_saving_error_bound(parts in prop::collection::vec(arb_stream(), 1..4), tail in arb_stream()) {
        let config = SpaceSavingConfig::new(5).unwrap();
        let mut truth: HashMap<String, u64> = HashMap::new();
        let mut merged = SpaceSaving::zero(&config).unwrap();

        for part in parts {
            let mut hh = SpaceSaving::zero(&config).unwrap();
            for (item, weight) in part {
                let item = format!("item-{}", item);
                hh.add(&item, weight);
                *truth.entry(item).or_default() += weight;
            }
            merged.merge(&hh).unwrap();
            check_bounds(&merged, &truth)?;
        }

        for (item, weight) in tail {
            let item = format!("item-{}", item);
            merged.add(&item, weight);
            *truth.entry(item).or_default() += weight;
        }
        check_bounds(&merged, &truth)?;
        prop_assert!(merged.validate().is_ok());
    }

    #[test]
    fn payload_roundtrip_is_lossless(hll in arb_hll(), hh in arb_space_saving(), topk in arb_topk()) {
        prop_assert_eq!(HyperLogLog::from_bytes(&hll.to_bytes().unwrap()).unwrap(), hll);
        prop_assert_eq!(SpaceSaving::from_bytes(&hh.to_bytes().unwrap()).unwrap(), hh);
        prop_assert_eq!(TopK::from_bytes(&topk.to_bytes().unwrap()).unwrap(), topk);
    }
}

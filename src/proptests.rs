use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeMap;

/// Narrow key space so inserts, overwrites and removals collide often.
#[derive(Clone, Debug, Arbitrary)]
enum Op {
    Insert(#[proptest(strategy = "0i16..256")] i16, i32),
    Remove(#[proptest(strategy = "0i16..256")] i16),
    Get(#[proptest(strategy = "0i16..256")] i16),
    Next(#[proptest(strategy = "-1i16..257")] i16),
    Previous(#[proptest(strategy = "-1i16..257")] i16),
    Range(
        #[proptest(strategy = "-8i16..264")] i16,
        #[proptest(strategy = "-8i16..264")] i16,
    ),
}

#[derive(Clone, Debug, Arbitrary)]
enum CounterOp {
    Increase(#[proptest(strategy = "0i64..64")] i64, #[proptest(strategy = "1i64..50")] i64),
    Reduce(#[proptest(strategy = "0i64..64")] i64, #[proptest(strategy = "1i64..50")] i64),
}

fn sorted_pairs() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::btree_map(any::<i64>(), 1i64..1_000, 0..=512)
        .prop_map(|m| m.into_iter().collect())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_with_btreemap(ops in prop::collection::vec(any::<Op>(), 0..=1500)) {
        let mut t: RbTree<i16, i32> = RbTree::new();
        let mut m: BTreeMap<i16, i32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    prop_assert_eq!(t.insert(key, value), m.insert(key, value));
                    t.validate();
                }
                Op::Remove(key) => {
                    prop_assert_eq!(t.remove(&key), m.remove(&key));
                    t.validate();
                }
                Op::Get(key) => {
                    prop_assert_eq!(t.get(&key), m.get(&key));
                }
                Op::Next(key) => {
                    let expected = m.range(key + 1..).next();
                    prop_assert_eq!(t.next(&key), expected);
                }
                Op::Previous(key) => {
                    let expected = m.range(..key).next_back();
                    prop_assert_eq!(t.previous(&key), expected);
                }
                Op::Range(lo, hi) => {
                    let got: Vec<(&i16, &i32)> = t.range(&lo, &hi).collect();
                    let expected: Vec<(&i16, &i32)> = if lo <= hi {
                        m.range(lo..=hi).collect()
                    } else {
                        Vec::new()
                    };
                    prop_assert_eq!(got, expected);
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        let got: Vec<(i16, i32)> = t.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(i16, i32)> = m.into_iter().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_bulk_load_round_trip(pairs in sorted_pairs()) {
        let (keys, values): (Vec<i64>, Vec<i64>) = pairs.iter().copied().unzip();
        let t = RbTree::from_sorted(keys, values).unwrap();
        t.validate();
        let got: Vec<(i64, i64)> = t.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(got, pairs);
    }

    #[test]
    fn prop_range_sum_matches_brute_force(
        pairs in sorted_pairs(),
        bounds in prop::collection::vec((any::<i64>(), any::<i64>()), 1..32),
    ) {
        let reference: BTreeMap<i64, i64> = pairs.iter().copied().collect();
        let (ids, counts): (Vec<i64>, Vec<i64>) = pairs.into_iter().unzip();
        let c = Counter::from_sorted(ids, counts).unwrap();

        for (a, b) in bounds {
            let expected: i64 = if a <= b { reference.range(a..=b).map(|(_, v)| v).sum() } else { 0 };
            prop_assert_eq!(c.in_range(a, b), expected);
        }
        prop_assert_eq!(c.in_range(i64::MIN, i64::MAX), reference.values().sum::<i64>());
    }

    #[test]
    fn prop_counter_matches_model(ops in prop::collection::vec(any::<CounterOp>(), 0..=800)) {
        let mut c = Counter::new();
        let mut m: BTreeMap<i64, i64> = BTreeMap::new();

        for op in ops {
            match op {
                CounterOp::Increase(id, amount) => {
                    let count = m.entry(id).or_insert(0);
                    *count += amount;
                    prop_assert_eq!(c.increase(id, amount), *count);
                }
                CounterOp::Reduce(id, amount) => {
                    let expected = match m.get(&id).copied() {
                        Some(count) if count > amount => {
                            m.insert(id, count - amount);
                            count - amount
                        }
                        Some(_) => {
                            m.remove(&id);
                            0
                        }
                        None => 0,
                    };
                    prop_assert_eq!(c.reduce(id, amount), expected);
                    prop_assert_eq!(c.count(id), expected);
                }
            }
        }

        c.tree().validate();
        let got: Vec<(i64, i64)> = c.tree().iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(i64, i64)> = m.into_iter().collect();
        prop_assert_eq!(got, expected);
    }
}

/// Steps `items` to the next greater ordering in place. Returns `false` once the
/// slice is back to ascending order after the last (descending) ordering.
fn next_ordering<T: Ord>(items: &mut [T]) -> bool {
    let Some(pivot) = (1..items.len()).rev().find(|&i| items[i - 1] < items[i]).map(|i| i - 1) else {
        items.reverse();
        return false;
    };
    let swap = (pivot + 1..items.len())
        .rev()
        .find(|&j| items[j] > items[pivot])
        .unwrap_or(pivot + 1);
    items.swap(pivot, swap);
    items[pivot + 1..].reverse();
    true
}

/// Calls `f` with every ordering of the distinct `keys`, in lexicographic order.
fn for_each_ordering<T: Ord + Clone>(keys: &[T], mut f: impl FnMut(Vec<T>)) {
    let mut order = keys.to_vec();
    order.sort();
    loop {
        f(order.clone());
        if !next_ordering(&mut order) {
            break;
        }
    }
}

#[test]
fn orderings_are_complete_and_distinct() {
    let mut seen = std::collections::BTreeSet::new();
    for_each_ordering(&[3, 1, 4, 2], |order| {
        assert!(seen.insert(order));
    });
    assert_eq!(seen.len(), 24);
    assert_eq!(seen.first(), Some(&vec![1, 2, 3, 4]));
    assert_eq!(seen.last(), Some(&vec![4, 3, 2, 1]));

    let mut single = 0;
    for_each_ordering(&[9], |_| single += 1);
    assert_eq!(single, 1);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys: Vec<u8> = (1..=7).collect();

    for_each_ordering(&keys, |perm| {
        let mut t: RbTree<u8, usize> = RbTree::new();
        for (i, k) in perm.into_iter().enumerate() {
            assert_eq!(t.insert(k, i), None);
            t.validate();
        }
        let got: Vec<u8> = t.iter().map(|(k, _)| *k).collect();
        assert_eq!(got, keys);
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys: Vec<u8> = (1..=7).collect();

    // Both an insertion-built and a bulk-built tree, emptied in every order.
    let mut inserted: RbTree<u8, u8> = RbTree::new();
    for &k in &keys {
        inserted.insert(k, k);
    }
    let bulk = RbTree::from_sorted(keys.clone(), keys.clone()).unwrap();

    for base in [inserted, bulk] {
        for_each_ordering(&keys, |perm| {
            let mut t = base.clone();
            let mut remaining = keys.len();
            for k in perm {
                assert_eq!(t.remove(&k), Some(k));
                remaining -= 1;
                assert_eq!(t.len(), remaining);
                t.validate();
            }
            assert!(t.is_empty());
            assert!(t.root.is_none());
        });
    }
}

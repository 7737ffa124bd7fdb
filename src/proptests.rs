use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeMap;

fn validate_tree<V>(t: &RadixTree<V>) {
    if let Err(err) = t.validate() {
        panic!("invalid tree: {err}");
    }
    assert_eq!(t.iter().count(), t.len(), "iteration must see every key");
}

fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    // Few distinct bytes so keys share prefixes and exercise splits and merges.
    let byte = prop_oneof![
        4 => Just(b'a'),
        4 => Just(b'b'),
        2 => Just(b'/'),
        1 => any::<u8>(),
    ];
    prop::collection::vec(byte, 0..=10)
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 40)]
    Insert(#[proptest(strategy = "key_strategy()")] Vec<u8>, u64),
    #[proptest(weight = 25)]
    Delete(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 3)]
    DeletePrefix(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 3)]
    WalkDeletePrefix(#[proptest(strategy = "key_strategy()")] Vec<u8>, bool),
    #[proptest(weight = 20)]
    Get(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 8)]
    LongestPrefix(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 1)]
    Compact,
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(any::<Op>(), 0..=1000)
}

fn model_longest_prefix<'a>(m: &'a BTreeMap<Vec<u8>, u64>, key: &[u8]) -> Option<(&'a [u8], u64)> {
    m.iter()
        .filter(|(k, _)| key.starts_with(k))
        .max_by_key(|(k, _)| k.len())
        .map(|(k, v)| (k.as_slice(), *v))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in ops_strategy()) {
        let mut t: RadixTree<u64> = RadixTree::new();
        let mut m: BTreeMap<Vec<u8>, u64> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    let old_t = t.insert(&key, value);
                    let old_m = m.insert(key, value);
                    prop_assert_eq!(old_t, old_m);
                }
                Op::Delete(key) => {
                    let old_t = t.delete(&key);
                    let old_m = m.remove(key.as_slice());
                    prop_assert_eq!(old_t, old_m);
                }
                Op::DeletePrefix(prefix) => {
                    let before = m.len();
                    m.retain(|k, _| !k.starts_with(&prefix));
                    prop_assert_eq!(t.delete_prefix(&prefix), before - m.len());
                }
                Op::WalkDeletePrefix(prefix, every_other) => {
                    let mut visited = Vec::new();
                    let mut n = 0usize;
                    t.walk_prefix_mut(&prefix, |entry| {
                        visited.push(entry.key().to_vec());
                        if !every_other || n % 2 == 0 {
                            entry.delete();
                        }
                        n += 1;
                        false
                    });

                    let expected: Vec<Vec<u8>> = m
                        .keys()
                        .filter(|k| k.starts_with(&prefix))
                        .cloned()
                        .collect();
                    prop_assert_eq!(&visited, &expected);
                    for (i, k) in expected.iter().enumerate() {
                        if !every_other || i % 2 == 0 {
                            m.remove(k);
                        }
                    }
                }
                Op::Get(key) => {
                    let got_t = t.get(&key).copied();
                    let got_m = m.get(key.as_slice()).copied();
                    prop_assert_eq!(got_t, got_m);
                }
                Op::LongestPrefix(key) => {
                    let got_t = t.longest_prefix(&key).map(|(k, v)| (k, *v));
                    prop_assert_eq!(got_t, model_longest_prefix(&m, &key));
                }
                Op::Compact => {
                    t.compact();
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        validate_tree(&t);
        let got: Vec<(Vec<u8>, u64)> = t.iter().map(|(k, v)| (k.to_vec(), *v)).collect();
        let expected: Vec<(Vec<u8>, u64)> = m.iter().map(|(k, v)| (k.clone(), *v)).collect();
        prop_assert_eq!(got, expected);
        prop_assert_eq!(t.minimum().map(|(k, _)| k.to_vec()), m.keys().next().cloned());
        prop_assert_eq!(t.maximum().map(|(k, _)| k.to_vec()), m.keys().next_back().cloned());
    }

    #[test]
    fn prop_walk_prefix_matches_filter(
        keys in prop::collection::vec(key_strategy(), 0..=200),
        prefix in key_strategy(),
    ) {
        let t: RadixTree<()> = keys.iter().map(|k| (k, ())).collect();
        let m: BTreeMap<Vec<u8>, ()> = keys.iter().map(|k| (k.clone(), ())).collect();

        let mut got = Vec::new();
        t.walk_prefix(&prefix, |k, _| {
            got.push(k.to_vec());
            false
        });
        let expected: Vec<Vec<u8>> = m.keys().filter(|k| k.starts_with(&prefix)).cloned().collect();
        prop_assert_eq!(got, expected);

        let mut got = Vec::new();
        t.walk_path(&prefix, |k, _| {
            got.push(k.to_vec());
            false
        });
        let expected: Vec<Vec<u8>> = m.keys().filter(|k| prefix.starts_with(k)).cloned().collect();
        prop_assert_eq!(got, expected);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

fn small_key_set() -> Vec<Vec<u8>> {
    vec![
        b"".to_vec(),
        b"a".to_vec(),
        b"b".to_vec(),
        b"aa".to_vec(),
        b"ab".to_vec(),
        b"aab".to_vec(),
        b"ba".to_vec(),
    ]
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys = small_key_set();

    for_each_permutation(&keys, |perm| {
        let mut t: RadixTree<u64> = RadixTree::new();
        let mut m: BTreeMap<Vec<u8>, u64> = BTreeMap::new();

        for (i, k) in perm.into_iter().enumerate() {
            let v = i as u64;
            assert_eq!(t.insert(&k, v), m.insert(k, v));
        }

        validate_tree(&t);
        let got: Vec<(Vec<u8>, u64)> = t.iter().map(|(k, v)| (k.to_vec(), *v)).collect();
        let expected: Vec<(Vec<u8>, u64)> = m.iter().map(|(k, v)| (k.clone(), *v)).collect();
        assert_eq!(got, expected);
    });
}

#[test]
fn exhaustive_delete_order_small_set() {
    let keys = small_key_set();

    // Insert in a fixed order, then delete in all permutations.
    let mut base_tree: RadixTree<u64> = RadixTree::new();
    let mut base_map: BTreeMap<Vec<u8>, u64> = BTreeMap::new();
    for (i, k) in keys.iter().enumerate() {
        let v = i as u64;
        assert_eq!(base_tree.insert(k, v), base_map.insert(k.clone(), v));
    }

    for_each_permutation(&keys, |perm| {
        let mut t = base_tree.clone();
        let mut m = base_map.clone();

        for k in perm {
            assert_eq!(t.delete(&k), m.remove(k.as_slice()));
            assert_eq!(t.len(), m.len());
            validate_tree(&t);
        }
        assert_eq!(t.len(), 0);
        assert_eq!(t.node_count(), 1);
    });
}

#[test]
fn exhaustive_walk_delete_subsets_small_set() {
    let keys = small_key_set();
    let base: RadixTree<u64> = keys.iter().zip(0u64..).map(|(k, v)| (k, v)).collect();

    // Every subset of keys to delete, chosen by bitmask.
    for mask in 0u32..(1 << keys.len()) {
        let mut t = base.clone();
        let mut visited = Vec::new();
        t.walk_mut(|entry| {
            let idx = keys
                .iter()
                .position(|k| k.as_slice() == entry.key())
                .unwrap();
            visited.push(idx);
            if mask & (1 << idx) != 0 {
                entry.delete();
            }
            false
        });

        let mut sorted = keys.clone();
        sorted.sort();
        let expected_order: Vec<usize> = sorted
            .iter()
            .map(|k| keys.iter().position(|x| x == k).unwrap())
            .collect();
        assert_eq!(visited, expected_order, "mask {mask:#b}");

        validate_tree(&t);
        let remaining: Vec<Vec<u8>> = t.iter().map(|(k, _)| k.to_vec()).collect();
        let expected: Vec<Vec<u8>> = sorted
            .into_iter()
            .filter(|k| {
                let idx = keys.iter().position(|x| x == k).unwrap();
                mask & (1 << idx) == 0
            })
            .collect();
        assert_eq!(remaining, expected, "mask {mask:#b}");
    }
}

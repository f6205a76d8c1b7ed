#![cfg(test)]

// Property tests for LogHashTable kept inside the crate so they can reach
// the bucket index through the diagnostic accessors.

use crate::config::{Probe, TableConfig};
use crate::table::LogHashTable;
use core::ops::ControlFlow;
use proptest::prelude::*;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hasher};

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Put(usize, i32),
    Lookup(usize),
    Absent(String),
    Tombstone(usize),
    Mutate(usize, i32),
    Iterate,
    StopAt(usize),
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=12).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Put(i, v)),
            2 => idx.clone().prop_map(OpI::Lookup),
            1 => "[A-Z]{1,4}".prop_map(OpI::Absent),
            1 => idx.clone().prop_map(OpI::Tombstone),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Iterate),
            1 => (0usize..16).prop_map(OpI::StopAt),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Drive one table against a HashMap model plus an insertion-order log.
// Invariants exercised across random operation sequences:
// - Every live key looks up to the last value written for it.
// - Keys never inserted (or tombstoned) are not found.
// - Updates return the previous value and do not append.
// - `len` counts slots used (monotone), `capacity >= len`, buckets fixed.
// - `for_each` visits live entries in insertion order and stops before the
//   entry that breaks.
fn run_scenario<S: BuildHasher>(
    mut sut: LogHashTable<i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let num_buckets = sut.num_buckets();
    let mut model: HashMap<String, i32> = HashMap::new();
    // Insertion-order log of keys; None once tombstoned.
    let mut order: Vec<Option<String>> = Vec::new();

    for op in ops {
        let used_before = sut.len();
        match op {
            OpI::Put(i, v) => {
                let k = &pool[i];
                let prev = sut.insert_or_update(k.as_str(), v).expect("insert");
                prop_assert_eq!(prev, model.insert(k.clone(), v));
                if prev.is_some() {
                    prop_assert_eq!(sut.len(), used_before, "update must not append");
                } else {
                    prop_assert_eq!(sut.len(), used_before + 1);
                    order.push(Some(k.clone()));
                }
            }
            OpI::Lookup(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.get(k), model.get(k));
                if let Some(idx) = sut.lookup(k) {
                    prop_assert_eq!(idx.key(&sut), Some(k.as_bytes()));
                    prop_assert_eq!(order[idx.get()].as_deref(), Some(k.as_str()));
                }
            }
            OpI::Absent(s) => {
                // Pool keys are lowercase, so these were never inserted.
                prop_assert!(sut.lookup(&s).is_none());
            }
            OpI::Tombstone(i) => {
                let k = &pool[i];
                match sut.lookup(k) {
                    Some(idx) => {
                        let key = sut.tombstone(idx).expect("live entry");
                        prop_assert_eq!(&*key, k.as_bytes());
                        model.remove(k);
                        order[idx.get()] = None;
                    }
                    None => prop_assert!(!model.contains_key(k)),
                }
                prop_assert!(sut.lookup(k).is_none());
            }
            OpI::Mutate(i, d) => {
                let k = &pool[i];
                if let Some(v) = sut.get_mut(k) {
                    *v = v.wrapping_add(d);
                    let mv = model.get_mut(k).expect("model has live key");
                    *mv = mv.wrapping_add(d);
                } else {
                    prop_assert!(!model.contains_key(k));
                }
            }
            OpI::Iterate => {
                let mut seen: Vec<String> = Vec::new();
                let n = sut.for_each(|idx, e| {
                    let k = String::from_utf8(e.key().expect("live").to_vec()).unwrap();
                    assert_eq!(Some(idx), sut.lookup(&k));
                    seen.push(k);
                    ControlFlow::Continue(())
                });
                let expected: Vec<String> = order.iter().flatten().cloned().collect();
                prop_assert_eq!(n, expected.len());
                prop_assert_eq!(seen, expected);
            }
            OpI::StopAt(stop) => {
                let live = order.iter().flatten().count();
                let mut calls = 0usize;
                let n = sut.for_each(|_, _| {
                    calls += 1;
                    if calls == stop + 1 {
                        ControlFlow::Break(())
                    } else {
                        ControlFlow::Continue(())
                    }
                });
                prop_assert_eq!(n, stop.min(live));
            }
        }

        // Post-conditions after each op
        prop_assert!(sut.len() >= used_before);
        prop_assert!(sut.capacity() >= sut.len());
        prop_assert_eq!(sut.num_buckets(), num_buckets);
        prop_assert_eq!(sut.count_live(), model.len());
        for (k, v) in &model {
            prop_assert_eq!(sut.get(k), Some(v));
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_linear_scan((pool, ops) in arb_scenario(), buckets in 1usize..9, cap in 0usize..4) {
        let sut = LogHashTable::with_config(TableConfig::new(buckets, cap)).unwrap();
        run_scenario(sut, &pool, ops)?;
    }

    #[test]
    fn prop_chained((pool, ops) in arb_scenario(), buckets in 1usize..9, cap in 0usize..4) {
        let sut = LogHashTable::with_config(
            TableConfig::new(buckets, cap).with_probe(Probe::Chained),
        ).unwrap();
        run_scenario(sut, &pool, ops)?;
    }

    // Same invariants under worst-case collision behavior (constant hasher).
    #[test]
    fn prop_with_collisions((pool, ops) in arb_scenario(), chained in any::<bool>()) {
        let probe = if chained { Probe::Chained } else { Probe::LinearScan };
        let sut = LogHashTable::with_config_and_hasher(
            TableConfig::new(4, 1).with_probe(probe),
            ConstBuildHasher,
        ).unwrap();
        run_scenario(sut, &pool, ops)?;
    }

    // Linear scan: a non-empty bucket always records the smallest offset of
    // any entry hashed into it.
    #[test]
    fn prop_bucket_records_first_offset(keys in proptest::collection::vec("[a-zA-Z0-9]{1,6}", 1..40), buckets in 1usize..7) {
        let mut t = LogHashTable::create(buckets, 2).unwrap();
        for k in &keys {
            t.insert_or_update(k.as_str(), ()).unwrap();
        }
        for b in 0..buckets {
            let first = t.iter().find(|(_, k, _)| t.bucket_for(*k) == b).map(|(i, _, _)| i);
            prop_assert_eq!(t.bucket_offset(b), first);
        }
    }
}

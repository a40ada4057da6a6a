//! Property-Based Tests for the Cache Store
//!
//! Random operation sequences checked against the index invariants and a
//! plain model of first-writer-wins semantics.

use bytes::Bytes;
use proptest::prelude::*;
use std::collections::HashMap;

use crate::storage::CacheStore;

const START: u64 = 1_000_000;
const TEST_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
enum StoreOp {
    Insert { key: u8, value: u8, ttl: u64 },
    Remove { key: u8 },
    Find { key: u8 },
    Tick { secs: u64 },
    Cleanup,
}

fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    // A small key space makes collisions and shared buckets common
    prop_oneof![
        4 => (0u8..32, any::<u8>(), 0u64..20)
            .prop_map(|(key, value, ttl)| StoreOp::Insert { key, value, ttl }),
        2 => (0u8..32).prop_map(|key| StoreOp::Remove { key }),
        2 => (0u8..32).prop_map(|key| StoreOp::Find { key }),
        1 => (0u64..5).prop_map(|secs| StoreOp::Tick { secs }),
        1 => Just(StoreOp::Cleanup),
    ]
}

fn key(k: u8) -> Bytes {
    Bytes::from(vec![k; 32])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_index_stays_consistent(ops in prop::collection::vec(store_op_strategy(), 1..200)) {
        let mut store = CacheStore::with_capacity(TEST_CAPACITY);
        let mut now = START;

        for op in ops {
            match op {
                StoreOp::Insert { key: k, value, ttl } => {
                    store.insert_at(key(k), Bytes::from(vec![value]), ttl, now);
                }
                StoreOp::Remove { key: k } => {
                    store.remove(&key(k));
                }
                StoreOp::Find { key: k } => {
                    let _ = store.find(&key(k));
                }
                StoreOp::Tick { secs } => now += secs,
                StoreOp::Cleanup => {
                    store.cleanup(now);
                }
            }
            store.assert_consistent();
            prop_assert!(store.len() <= TEST_CAPACITY);
        }
    }

    #[test]
    fn prop_first_writer_wins(
        writes in prop::collection::vec((0u8..8, any::<u8>()), 1..100)
    ) {
        // Long TTLs and a roomy cap: nothing expires or gets evicted here
        let mut store = CacheStore::new();
        let mut model: HashMap<u8, u8> = HashMap::new();

        for (k, value) in writes {
            let inserted = store.insert_at(key(k), Bytes::from(vec![value]), 3_600, START);
            prop_assert_eq!(inserted, !model.contains_key(&k));
            model.entry(k).or_insert(value);
        }

        for (k, value) in model {
            prop_assert_eq!(store.find(&key(k)), Some(Bytes::from(vec![value])));
        }
    }

    #[test]
    fn prop_cleanup_respects_boundary(ttls in prop::collection::vec(0u64..50, 1..100), at in 0u64..60) {
        let mut store = CacheStore::new();
        for (i, ttl) in ttls.iter().enumerate() {
            store.insert_at(Bytes::from((i as u32).to_be_bytes().to_vec()), Bytes::new(), *ttl, START);
        }

        let now = START + at;
        store.cleanup(now);

        for (i, ttl) in ttls.iter().enumerate() {
            let present = store.find(&(i as u32).to_be_bytes()).is_some();
            prop_assert_eq!(present, START + ttl >= now);
        }
        store.assert_consistent();
    }
}

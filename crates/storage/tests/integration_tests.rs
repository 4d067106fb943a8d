//! Integration tests for TableStore
//!
//! - Batches are installed atomically with respect to concurrent readers
//! - Set reads agree with scans for arbitrary insert sequences

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use mopstore_core::{Key, Storage, TableKind, Value, Write};
use mopstore_storage::TableStore;
use proptest::prelude::*;

#[test]
fn test_readers_never_observe_half_a_batch() {
    let store = Arc::new(TableStore::new());
    let done = Arc::new(AtomicBool::new(false));
    let barrier = Arc::new(Barrier::new(3));

    // Writer keeps keys 1 and 2 equal; every batch writes both.
    let writer = {
        let store = Arc::clone(&store);
        let done = Arc::clone(&done);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for version in 1..=500u64 {
                let v = Value::Int(version as i64);
                store
                    .apply_batch(
                        &[
                            Write::Put {
                                table: TableKind::Lww,
                                key: 1,
                                value: v.clone(),
                            },
                            Write::Put {
                                table: TableKind::Lww,
                                key: 2,
                                value: v,
                            },
                        ],
                        version,
                    )
                    .unwrap();
            }
            done.store(true, Ordering::SeqCst);
        })
    };

    let readers: Vec<_> = (0..2)
        .map(|_| {
            let store = Arc::clone(&store);
            let done = Arc::clone(&done);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                while !done.load(Ordering::SeqCst) {
                    let rows = store.scan(TableKind::Lww).unwrap();
                    if rows.len() == 2 {
                        assert_eq!(rows[0].v, rows[1].v, "torn batch observed");
                        assert_eq!(rows[0].version, rows[1].version);
                    } else {
                        assert!(rows.is_empty());
                    }
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }
    assert_eq!(store.current_version(), 500);
}

proptest! {
    #[test]
    fn prop_set_get_matches_scan(members in prop::collection::vec((0i64..5, any::<i64>()), 1..40)) {
        let store = TableStore::new();
        let writes: Vec<Write> = members
            .iter()
            .enumerate()
            .map(|(i, (key, value))| Write::Insert {
                id: i as u64 + 1,
                key: *key,
                value: Value::Int(*value),
            })
            .collect();
        store.apply_batch(&writes, 1).unwrap();

        let rows = store.scan(TableKind::Set).unwrap();
        prop_assert_eq!(rows.len(), members.len());

        for key in 0i64..5 {
            let expected: Vec<Value> = rows
                .iter()
                .filter(|r| r.k == key)
                .map(|r| r.v.clone())
                .collect();
            let got = store.get(TableKind::Set, key as Key).unwrap().map(|vv| vv.value);
            if expected.is_empty() {
                prop_assert!(got.is_none());
            } else {
                prop_assert_eq!(got, Some(Value::List(expected)));
            }
        }
        prop_assert_eq!(store.max_row_id(), members.len() as u64);
    }
}

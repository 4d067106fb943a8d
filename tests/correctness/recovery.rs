//! Durability across close and reopen.

use mopstore_durability::{WALEntry, WAL};

use crate::common::*;

#[test]
fn committed_batches_survive_reopen() {
    let mut store = TestStore::new();
    run_ok(store.executor(), TableKind::Lww, &[Mop::write(1, "one")]);
    run_ok(store.executor(), TableKind::Append, &[Mop::append(1, "a"), Mop::append(1, "b")]);
    run_ok(store.executor(), TableKind::Set, &[Mop::append(1, 10), Mop::append(1, 20)]);
    let version = store.executor().database().current_version();

    store.reopen();
    let executor = store.executor();
    assert_eq!(read(executor, TableKind::Lww, 1), Some(Value::from("one")));
    assert_eq!(read(executor, TableKind::Append, 1), Some(Value::from("a b")));
    assert_eq!(
        read(executor, TableKind::Set, 1),
        Some(Value::List(vec![Value::Int(10), Value::Int(20)]))
    );
    assert_eq!(executor.database().current_version(), version);
}

#[test]
fn incomplete_transaction_discarded_on_recovery() {
    let mut store = TestStore::new();
    run_ok(store.executor(), TableKind::Lww, &[Mop::write(1, "committed")]);
    store.close();

    {
        // A transaction that died between BeginTxn and CommitTxn
        let wal = WAL::open(wal_path(store.path()), DurabilityMode::Always).unwrap();
        wal.append(&WALEntry::BeginTxn {
            txn_id: 99,
            timestamp: 0,
        })
        .unwrap();
        wal.append(&WALEntry::Put {
            txn_id: 99,
            table: TableKind::Lww,
            key: 1,
            value: Value::from("torn"),
            version: 2,
        })
        .unwrap();
    }

    store.reopen();
    let executor = store.executor();
    assert_eq!(read(executor, TableKind::Lww, 1), Some(Value::from("committed")));
    assert_eq!(executor.database().current_version(), 1);

    // New commits continue from the last complete one
    run_ok(executor, TableKind::Lww, &[Mop::write(1, "next")]);
    assert_eq!(executor.list(TableKind::Lww).unwrap()[0].version, 2);
}

#[test]
fn set_identities_continue_without_reuse() {
    let mut store = TestStore::new();
    run_ok(store.executor(), TableKind::Set, &[Mop::append(1, "a"), Mop::append(1, "b")]);

    store.reopen();
    run_ok(store.executor(), TableKind::Set, &[Mop::append(2, "c")]);

    let ids: Vec<u64> = store
        .executor()
        .list(TableKind::Set)
        .unwrap()
        .iter()
        .filter_map(|row| row.id)
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn explicit_id_collides_with_recovered_member() {
    let mut store = TestStore::new();
    run_ok(store.executor(), TableKind::Set, &[Mop::append(1, "a").with_id(7)]);

    store.reopen();
    let error = run_info(store.executor(), TableKind::Set, &[Mop::append(2, "b").with_id(7)]);
    assert!(matches!(error, Error::ConstraintViolation { .. }));
}

#[test]
fn info_batch_not_recovered() {
    let mut store = TestStore::new();
    run_ok(store.executor(), TableKind::Set, &[Mop::append(1, "a").with_id(1)]);
    run_info(
        store.executor(),
        TableKind::Set,
        &[Mop::append(2, "lost"), Mop::append(3, "dup").with_id(1)],
    );

    store.reopen();
    assert_eq!(read(store.executor(), TableKind::Set, 2), None);
    assert_eq!(store.executor().list(TableKind::Set).unwrap().len(), 1);
}

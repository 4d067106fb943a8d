//! Contention: a batch that cannot get the writer lock is `info`.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use crate::{BatchOutcome, Error, Executor, Mop, TableKind, Value};
use mopstore_engine::Database;

#[test]
fn test_busy_batch_is_info_and_applies_nothing() {
    let db = Database::ephemeral();
    let executor = Executor::new(db.clone()).with_busy_timeout(Duration::from_millis(20));

    let held = db.begin_transaction().unwrap();
    let outcome = executor
        .execute_batch(TableKind::Lww, &[Mop::write(1, 1), Mop::write(2, 2)])
        .unwrap();
    drop(held);

    match outcome {
        BatchOutcome::Info { error } => assert!(error.is_busy(), "unexpected error {}", error),
        BatchOutcome::Ok { .. } => panic!("Expected info while the writer lock is held"),
    }
    assert!(executor.list(TableKind::Lww).unwrap().is_empty());
}

#[test]
fn test_lock_released_after_busy() {
    let db = Database::ephemeral();
    let executor = Executor::new(db.clone()).with_busy_timeout(Duration::from_millis(10));

    {
        let _held = db.begin_transaction().unwrap();
        let outcome = executor
            .execute_batch(TableKind::Append, &[Mop::append(1, "x")])
            .unwrap();
        assert!(matches!(outcome.error(), Some(Error::Busy { .. })));
    }

    let outcome = executor
        .execute_batch(TableKind::Append, &[Mop::append(1, "x")])
        .unwrap();
    assert!(outcome.is_ok());
}

#[test]
fn test_executor_timeout_overrides_database_default() {
    let db = Database::ephemeral();
    assert_eq!(Executor::new(db.clone()).busy_timeout(), db.busy_timeout());

    let executor = Executor::new(db).with_busy_timeout(Duration::from_millis(7));
    assert_eq!(executor.busy_timeout(), Duration::from_millis(7));
}

#[test]
fn test_concurrent_appends_never_lose_tokens() {
    let executor = Arc::new(Executor::new(Database::ephemeral()));
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = ["A", "B"]
        .into_iter()
        .map(|token| {
            let executor = Arc::clone(&executor);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                executor
                    .execute_batch(TableKind::Append, &[Mop::append(5, token)])
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap().is_ok());
    }

    let outcome = executor
        .execute_batch(TableKind::Append, &[Mop::read(5)])
        .unwrap();
    let merged = outcome.results().unwrap()[0].v.clone();
    assert!(
        merged == Some(Value::from("A B")) || merged == Some(Value::from("B A")),
        "unexpected merge {:?}",
        merged
    );
}

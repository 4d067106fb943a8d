//! Concurrent batches and the busy timeout.

use std::sync::Barrier;
use std::thread;
use std::time::Duration;

use crate::common::*;

#[test]
fn concurrent_appends_commit_in_lock_order() {
    for _ in 0..20 {
        let executor = shared(memory_executor());
        let barrier = std::sync::Arc::new(Barrier::new(2));

        let handles: Vec<_> = ["A", "B"]
            .into_iter()
            .map(|token| {
                let executor = executor.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    run_ok(&executor, TableKind::Append, &[Mop::append(5, token)]);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let merged = read(&executor, TableKind::Append, 5);
        assert!(
            merged == Some(Value::from("A B")) || merged == Some(Value::from("B A")),
            "unexpected merge {:?}",
            merged
        );
    }
}

#[test]
fn many_writers_lose_no_tokens() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 25;

    let executor = shared(memory_executor());
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let executor = executor.clone();
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    let token = format!("{}-{}", t, i);
                    run_ok(&executor, TableKind::Append, &[Mop::append(1, token)]);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let merged = read(&executor, TableKind::Append, 1).unwrap();
    let tokens: Vec<&str> = merged.as_str().unwrap().split(' ').collect();
    assert_eq!(tokens.len(), THREADS * PER_THREAD);

    // Each writer's own tokens appear in its submission order
    for t in 0..THREADS {
        let prefix = format!("{}-", t);
        let mine: Vec<usize> = tokens
            .iter()
            .filter_map(|tok| tok.strip_prefix(prefix.as_str()))
            .map(|n| n.parse().unwrap())
            .collect();
        assert_eq!(mine, (0..PER_THREAD).collect::<Vec<_>>());
    }
}

#[test]
fn busy_batch_is_info_and_applies_nothing() {
    let db = Database::ephemeral();
    let executor = Executor::new(db.clone()).with_busy_timeout(Duration::from_millis(25));

    let mut held = db.begin_transaction().unwrap();
    let error = run_info(
        &executor,
        TableKind::Lww,
        &[Mop::write(1, 1), Mop::write(2, 2)],
    );
    assert!(error.is_busy());
    db.abort_transaction(&mut held, "test done").unwrap();

    assert_eq!(read(&executor, TableKind::Lww, 1), None);
    assert_eq!(read(&executor, TableKind::Lww, 2), None);
}

#[test]
fn set_ids_are_unique_under_concurrency() {
    let executor = shared(memory_executor());
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let executor = executor.clone();
            thread::spawn(move || {
                for i in 0..10 {
                    run_ok(&executor, TableKind::Set, &[Mop::append(t, i)]);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut ids: Vec<u64> = executor
        .list(TableKind::Set)
        .unwrap()
        .iter()
        .filter_map(|row| row.id)
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=40).collect::<Vec<_>>());
}

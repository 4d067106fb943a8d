//! A batch that fails anywhere leaves no trace.

use crate::common::*;

#[test]
fn failure_after_writes_leaves_pre_batch_state() {
    let executor = memory_executor();
    run_ok(&executor, TableKind::Set, &[Mop::append(100, "seed").with_id(1)]);

    for failing_index in 1..4 {
        let mut ops: Vec<Mop> = (0..failing_index)
            .map(|i| Mop::append(i as i64, format!("v{}", i)))
            .collect();
        ops.push(Mop::append(50, "dup").with_id(1));

        let error = run_info(&executor, TableKind::Set, &ops);
        assert!(matches!(error, Error::ConstraintViolation { .. }));

        for i in 0..failing_index {
            assert_eq!(read(&executor, TableKind::Set, i as i64), None);
        }
        assert_eq!(read(&executor, TableKind::Set, 50), None);
    }
    assert_eq!(executor.list(TableKind::Set).unwrap().len(), 1);
}

#[test]
fn failed_batch_does_not_consume_a_version() {
    let executor = memory_executor();
    run_ok(&executor, TableKind::Set, &[Mop::append(1, 1).with_id(1)]);
    run_info(&executor, TableKind::Set, &[Mop::append(1, 2).with_id(1)]);
    run_ok(&executor, TableKind::Set, &[Mop::append(1, 3)]);

    let versions: Vec<u64> = executor
        .list(TableKind::Set)
        .unwrap()
        .iter()
        .map(|row| row.version)
        .collect();
    assert_eq!(versions, vec![1, 2]);
}

#[test]
fn failed_batch_in_one_table_keeps_other_tables() {
    let executor = memory_executor();
    run_ok(&executor, TableKind::Lww, &[Mop::write(1, "kept")]);
    run_ok(&executor, TableKind::Set, &[Mop::append(1, "m").with_id(9)]);
    run_info(&executor, TableKind::Set, &[Mop::append(2, "n").with_id(9)]);

    assert_eq!(read(&executor, TableKind::Lww, 1), Some(Value::from("kept")));
}

#[test]
fn validation_failure_is_err_not_info() {
    let executor = memory_executor();
    let err = executor
        .execute_batch(TableKind::Append, &[Mop::append(1, "a"), Mop::write(1, "b")])
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(read(&executor, TableKind::Append, 1), None);
}

//! Per-table merge behavior.

use crate::common::*;

#[test]
fn read_your_own_writes() {
    let executor = memory_executor();
    let results = run_ok(&executor, TableKind::Lww, &[Mop::write(7, 70), Mop::read(7)]);
    assert_eq!(results[1].v, Some(Value::Int(70)));

    let results = run_ok(
        &executor,
        TableKind::Set,
        &[Mop::append(7, 1), Mop::read(7), Mop::append(7, 2), Mop::read(7)],
    );
    assert_eq!(results[1].v, Some(Value::List(vec![Value::Int(1)])));
    assert_eq!(
        results[3].v,
        Some(Value::List(vec![Value::Int(1), Value::Int(2)]))
    );
}

#[test]
fn merge_order() {
    let executor = memory_executor();
    run_ok(&executor, TableKind::Append, &[Mop::append(1, "a")]);
    run_ok(&executor, TableKind::Append, &[Mop::append(1, "b")]);
    run_ok(&executor, TableKind::Append, &[Mop::append(2, "b")]);
    run_ok(&executor, TableKind::Append, &[Mop::append(2, "a")]);

    assert_eq!(read(&executor, TableKind::Append, 1), Some(Value::from("a b")));
    assert_eq!(read(&executor, TableKind::Append, 2), Some(Value::from("b a")));
}

#[test]
fn overwrite_is_idempotent() {
    let executor = memory_executor();
    for _ in 0..3 {
        let results = run_ok(&executor, TableKind::Lww, &[Mop::write(1, "same")]);
        assert_eq!(results[0].v, Some(Value::from("same")));
    }
    let rows = executor.list(TableKind::Lww).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].v, Value::from("same"));
    assert_eq!(rows[0].version, 3);
}

#[test]
fn overwrite_replaces_entirely() {
    let executor = memory_executor();
    run_ok(
        &executor,
        TableKind::Lww,
        &[Mop::write(1, Value::List(vec![Value::Int(1), Value::Int(2)]))],
    );
    run_ok(&executor, TableKind::Lww, &[Mop::write(1, "x")]);
    assert_eq!(read(&executor, TableKind::Lww, 1), Some(Value::from("x")));
}

#[test]
fn set_insert_independence() {
    let executor = memory_executor();
    run_ok(&executor, TableKind::Set, &[Mop::append(3, "a").with_id(1)]);
    run_ok(&executor, TableKind::Set, &[Mop::append(3, "b").with_id(2)]);

    assert_eq!(
        read(&executor, TableKind::Set, 3),
        Some(Value::List(vec![Value::from("a"), Value::from("b")]))
    );
}

#[test]
fn set_members_with_equal_values_are_distinct() {
    let executor = memory_executor();
    run_ok(&executor, TableKind::Set, &[Mop::append(3, "a"), Mop::append(3, "a")]);
    assert_eq!(
        read(&executor, TableKind::Set, 3),
        Some(Value::List(vec![Value::from("a"), Value::from("a")]))
    );
}

#[test]
fn absent_key_reads_null() {
    let executor = memory_executor();
    for table in [TableKind::Lww, TableKind::Append, TableKind::Set] {
        let results = run_ok(&executor, table, &[Mop::read(-1)]);
        assert_eq!(results, vec![MopResult::read(-1, None)]);
    }
}

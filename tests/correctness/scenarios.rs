//! Wire-level scenarios.

use serde_json::json;

use crate::common::*;

#[test]
fn read_append_read_on_empty_merge_table() {
    let executor = memory_executor();
    let outcome = executor
        .execute_batch(
            TableKind::Append,
            &[Mop::read(1), Mop::append(1, "x"), Mop::read(1)],
        )
        .unwrap();

    assert_eq!(
        serde_json::to_value(&outcome).unwrap(),
        json!({
            "type": "ok",
            "value": [
                {"f": "r", "k": 1, "v": null},
                {"f": "append", "k": 1, "v": "x"},
                {"f": "r", "k": 1, "v": "x"}
            ]
        })
    );
}

#[test]
fn request_lines_map_to_ok_info_and_fail() {
    let executor = memory_executor();

    let ok = executor.handle_line(r#"{"table":"set","value":[{"f":"append","k":1,"v":1,"id":5}]}"#);
    let info = executor.handle_line(r#"{"table":"set","value":[{"f":"append","k":2,"v":2,"id":5}]}"#);
    let fail = executor.handle_line(r#"{"table":"set","value":[{"f":"w","k":1,"v":1}]}"#);

    assert_eq!(serde_json::to_value(&ok).unwrap()["type"], "ok");
    assert_eq!(serde_json::to_value(&info).unwrap()["type"], "info");
    assert_eq!(serde_json::to_value(&fail).unwrap()["type"], "fail");
}

#[test]
fn integer_append_tokens_echo_as_integers() {
    let executor = memory_executor();
    let response = executor.handle_line(
        r#"{"table":"append","value":[{"f":"append","k":4,"v":1},{"f":"append","k":4,"v":2},{"f":"r","k":4}]}"#,
    );
    assert_eq!(
        serde_json::to_value(&response).unwrap()["value"],
        json!([
            {"f": "append", "k": 4, "v": 1},
            {"f": "append", "k": 4, "v": 2},
            {"f": "r", "k": 4, "v": "1 2"}
        ])
    );
}

//! Properties and row formatting.
//!
//! Two modes for `pragma`:
//! - **Human** (default): one `name = value` line per property
//! - **JSON** (`--json`): `serde_json::to_string_pretty`
//!
//! Rows from `list` are always one compact JSON object per line.

use mopstore_executor::{Response, Row, StoreProperties};

/// Format the properties report.
pub fn format_properties(props: &StoreProperties, json: bool) -> String {
    if json {
        return serde_json::to_string_pretty(props)
            .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e));
    }

    let tx = &props.transactions;
    let mut lines = vec![
        format!("name = {}", props.name),
        format!("durability = {}", props.durability),
        format!("journal_mode = {}", props.journal_mode),
        format!("locking_mode = {}", props.locking_mode),
        format!("isolation = {}", props.isolation),
        format!("busy_timeout_ms = {}", props.busy_timeout_ms),
        format!("current_version = {}", props.current_version),
    ];
    if let Some(size) = props.wal_size_bytes {
        lines.push(format!("wal_size_bytes = {}", size));
    }
    lines.push(format!("rows.lww = {}", props.rows.lww));
    lines.push(format!("rows.append = {}", props.rows.append));
    lines.push(format!("rows.set = {}", props.rows.set));
    lines.push(format!("transactions.started = {}", tx.total_started));
    lines.push(format!("transactions.committed = {}", tx.total_committed));
    lines.push(format!("transactions.aborted = {}", tx.total_aborted));
    lines.push(format!("transactions.busy = {}", tx.total_busy));
    lines.join("\n")
}

/// Format one row as a JSON line.
pub fn format_row(row: &Row) -> String {
    serde_json::to_string(row).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

/// Format a response as a JSON line.
///
/// A response that cannot be encoded is reported as `info` carrying the
/// encoding error, so every request still gets exactly one line.
pub fn format_response(response: &Response) -> String {
    match response.to_json() {
        Ok(line) => line,
        Err(error) => {
            tracing::error!(target: "mopstore::executor", %error, "Failed to encode response");
            format!(
                "{{\"type\":\"info\",\"error\":{{\"Serialization\":{{\"reason\":{}}}}}}}",
                serde_json::Value::String(error.to_string())
            )
        }
    }
}

//! Batch validation.
//!
//! Everything here runs before the store is touched: a batch that fails
//! validation never begins and is reported as `fail`, not `info`.

use mopstore_core::{Mop, MopKind, TableKind, Value};

use crate::{Error, Result};

/// Operation kinds accepted by each table.
pub fn allowed_kinds(table: TableKind) -> &'static [MopKind] {
    match table {
        TableKind::Lww => &[MopKind::Read, MopKind::Write],
        TableKind::Append | TableKind::Set => &[MopKind::Read, MopKind::Append],
    }
}

/// Validate a whole batch against its table.
///
/// Rejects an empty batch, then each operation in order; the first bad
/// operation wins.
pub fn validate_batch(table: TableKind, ops: &[Mop]) -> Result<()> {
    if ops.is_empty() {
        return Err(Error::invalid_input("batch must contain at least one operation"));
    }
    for (index, mop) in ops.iter().enumerate() {
        validate_mop(table, index, mop)?;
    }
    Ok(())
}

fn validate_mop(table: TableKind, index: usize, mop: &Mop) -> Result<()> {
    if !allowed_kinds(table).contains(&mop.f) {
        return Err(Error::UnsupportedOperation {
            table: table.name().to_string(),
            op: mop.f.as_str().to_string(),
        });
    }

    match (mop.f.is_mutation(), &mop.v) {
        (false, Some(_)) => {
            return Err(Error::invalid_input(format!(
                "operation {}: '{}' of key {} carries a value",
                index, mop.f, mop.k
            )));
        }
        (true, None) => {
            return Err(Error::invalid_input(format!(
                "operation {}: '{}' of key {} is missing a value",
                index, mop.f, mop.k
            )));
        }
        (true, Some(value)) => validate_value(table, index, value)?,
        (false, None) => {}
    }

    if mop.id.is_some() && !(table == TableKind::Set && mop.f == MopKind::Append) {
        return Err(Error::invalid_input(format!(
            "operation {}: an explicit id is only accepted on set appends",
            index
        )));
    }

    Ok(())
}

fn validate_value(table: TableKind, index: usize, value: &Value) -> Result<()> {
    // merge tokens are joined as text
    if table == TableKind::Append && value.as_list().is_some() {
        return Err(Error::invalid_input(format!(
            "operation {}: append tokens must be a string or integer, got {}",
            index,
            value.type_name()
        )));
    }
    Ok(())
}

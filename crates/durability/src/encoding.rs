//! WAL entry encoding and decoding
//!
//! ## Entry Format
//!
//! ```text
//! [length: u32][type: u8][payload: bytes][crc32: u32]
//! ```
//!
//! - **length**: Total size of type + payload + crc (NOT including length itself)
//! - **type**: Entry type tag (1=BeginTxn, 2=Put, 3=Insert, 4=CommitTxn, 5=AbortTxn)
//! - **payload**: MessagePack-serialized WALEntry
//! - **crc32**: CRC32 checksum over \[type\]\[payload\]
//!
//! MessagePack is self-describing, which the untagged `Value` enum needs in
//! order to round-trip.

use crate::wal::WALEntry;
use crc32fast::Hasher;
use mopstore_core::{StoreError, StoreResult};

const TYPE_BEGIN_TXN: u8 = 1;
const TYPE_PUT: u8 = 2;
const TYPE_INSERT: u8 = 3;
const TYPE_COMMIT_TXN: u8 = 4;
const TYPE_ABORT_TXN: u8 = 5;

/// Minimum value of the length field: type(1) + crc(4)
const MIN_ENTRY_LEN: usize = 5;

fn type_tag(entry: &WALEntry) -> u8 {
    match entry {
        WALEntry::BeginTxn { .. } => TYPE_BEGIN_TXN,
        WALEntry::Put { .. } => TYPE_PUT,
        WALEntry::Insert { .. } => TYPE_INSERT,
        WALEntry::CommitTxn { .. } => TYPE_COMMIT_TXN,
        WALEntry::AbortTxn { .. } => TYPE_ABORT_TXN,
    }
}

fn checksum(type_tag: u8, payload: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[type_tag]);
    hasher.update(payload);
    hasher.finalize()
}

/// Encode WAL entry to bytes
///
/// Format: `[length: u32][type: u8][payload: bytes][crc32: u32]`
pub fn encode_entry(entry: &WALEntry) -> StoreResult<Vec<u8>> {
    let tag = type_tag(entry);
    let payload = rmp_serde::to_vec_named(entry)?;

    let total_len = 1 + payload.len() + 4;
    let total_len_u32 = u32::try_from(total_len).map_err(|_| {
        StoreError::storage(format!("WAL entry of {} bytes is too large", total_len))
    })?;

    let mut buf = Vec::with_capacity(4 + total_len);
    buf.extend_from_slice(&total_len_u32.to_le_bytes());
    buf.push(tag);
    buf.extend_from_slice(&payload);
    buf.extend_from_slice(&checksum(tag, &payload).to_le_bytes());

    Ok(buf)
}

/// Decode WAL entry from bytes with CRC validation
///
/// Returns the decoded entry and the number of bytes consumed. `offset` is
/// the file offset of `buf[0]`, used in error messages.
///
/// # Errors
///
/// - `StoreError::IncompleteEntry` when `buf` ends before the entry does
/// - `StoreError::Corruption` on an impossible length, CRC mismatch,
///   undecodable payload, or type tag mismatch
pub fn decode_entry(buf: &[u8], offset: u64) -> StoreResult<(WALEntry, usize)> {
    if buf.len() < 4 {
        return Err(StoreError::IncompleteEntry {
            offset,
            have: buf.len(),
            needed: 4,
        });
    }
    let total_len = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;

    if total_len < MIN_ENTRY_LEN {
        return Err(StoreError::corruption(format!(
            "offset {}: invalid entry length {} (minimum is {} bytes)",
            offset, total_len, MIN_ENTRY_LEN
        )));
    }

    if buf.len() < 4 + total_len {
        return Err(StoreError::IncompleteEntry {
            offset,
            have: buf.len(),
            needed: 4 + total_len,
        });
    }

    let tag = buf[4];
    let payload = &buf[5..4 + total_len - 4];
    let crc_start = 4 + total_len - 4;
    let expected_crc = u32::from_le_bytes([
        buf[crc_start],
        buf[crc_start + 1],
        buf[crc_start + 2],
        buf[crc_start + 3],
    ]);

    let actual_crc = checksum(tag, payload);
    if actual_crc != expected_crc {
        return Err(StoreError::corruption(format!(
            "offset {}: CRC mismatch: expected {:08x}, got {:08x}",
            offset, expected_crc, actual_crc
        )));
    }

    let entry: WALEntry = rmp_serde::from_slice(payload).map_err(|e| {
        StoreError::corruption(format!("offset {}: deserialization failed: {}", offset, e))
    })?;

    let expected_tag = type_tag(&entry);
    if tag != expected_tag {
        return Err(StoreError::corruption(format!(
            "offset {}: type tag mismatch: expected {}, got {}",
            offset, expected_tag, tag
        )));
    }

    Ok((entry, 4 + total_len))
}

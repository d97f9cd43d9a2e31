//! Byte helpers shared by the key codec and the store adapters.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Result, TesseraError};

/// Width of an encoded item identifier.
pub const ITEM_ID_LEN: usize = 8;

/// Encode an item identifier as 8 big-endian bytes.
pub fn u64_to_bytes(value: u64) -> [u8; ITEM_ID_LEN] {
    let mut buf = [0u8; ITEM_ID_LEN];
    BigEndian::write_u64(&mut buf, value);
    buf
}

/// Decode 8 big-endian bytes into an item identifier.
pub fn bytes_to_u64(bytes: &[u8]) -> Result<u64> {
    if bytes.len() != ITEM_ID_LEN {
        return Err(TesseraError::decode(format!(
            "item id must be {ITEM_ID_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    Ok(BigEndian::read_u64(bytes))
}

/// Shortest key that sorts after every key starting with `prefix`.
///
/// Returns `None` when no such key exists (empty prefix or all `0xFF`).
pub fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut succ = prefix.to_vec();
    while let Some(last) = succ.pop() {
        if last != u8::MAX {
            succ.push(last + 1);
            return Some(succ);
        }
    }
    None
}

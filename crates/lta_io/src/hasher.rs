//! SHA-256 over canonical JSON bytes. Hex digests are lowercase.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::canonical_json::to_canonical_bytes;
use crate::IoError;

/// SHA-256 over raw bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// SHA-256 over the canonical JSON form of any serializable value.
pub fn sha256_canonical<T: Serialize>(value: &T) -> Result<String, IoError> {
    Ok(sha256_hex(&to_canonical_bytes(value)?))
}

pub fn is_sha256_hex(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

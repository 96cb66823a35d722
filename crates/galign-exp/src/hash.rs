//! Content hashes used to tie sweep manifests to the plan that produced them.

use galign_core::errors::AlignError;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::serde::to_canonical_json_bytes;

/// Hex SHA-256 of the canonical JSON encoding of `value`.
pub fn stable_hash_string<T: Serialize>(value: &T) -> Result<String, AlignError> {
    let digest = Sha256::digest(to_canonical_json_bytes(value)?);
    Ok(format!("{digest:x}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_change_the_hash() {
        let a = stable_hash_string(&json!({"k_values": [1.0, 2.0], "measure": "nc"})).unwrap();
        let b = stable_hash_string(&json!({"measure": "nc", "k_values": [1.0, 2.0]})).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        let c = stable_hash_string(&json!({"measure": "nc", "k_values": [2.0, 1.0]})).unwrap();
        assert_ne!(a, c);
    }
}

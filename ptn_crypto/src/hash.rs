//! Keccak-256 hashing.

use ptn_types::Hash;
use sha3::{Digest, Keccak256};

/// Keccak-256 digest of `data`.
///
/// This is the original Keccak padding, not NIST SHA3-256.
pub fn keccak256(data: &[u8]) -> Hash {
    let digest = Keccak256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    Hash::new(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector_empty() {
        // Keccak-256 of the empty string.
        assert_eq!(
            keccak256(b"").to_string(),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn known_vector_abc() {
        assert_eq!(
            keccak256(b"abc").to_string(),
            "4e03657aea45a94fc7d47ba826c8d667c0d1e6e33a64a036ec44f58fa12d6c45"
        );
    }

    #[test]
    fn differs_from_inputs() {
        assert_ne!(keccak256(b"a"), keccak256(b"b"));
    }
}

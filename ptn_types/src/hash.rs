//! Content hash type for transactions, units and requests.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte Keccak-256 hash.
///
/// Identifies transactions, units and contract requests. A request and its
/// result transaction share the same request hash (see
/// [`Transaction::request_hash`](crate::Transaction::request_hash)).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Hash([u8; 32]);

impl Default for Hash {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Hash {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Short form used in log lines: first four bytes as hex.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({}\u{2026})", self.short())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_hash() {
        assert!(Hash::ZERO.is_zero());
        assert!(!Hash::new([1u8; 32]).is_zero());
    }

    #[test]
    fn display_is_full_hex() {
        let h = Hash::new([0xab; 32]);
        assert_eq!(format!("{h}").len(), 64);
        assert!(format!("{h}").starts_with("abab"));
    }

    #[test]
    fn short_is_four_bytes() {
        let h = Hash::new([0x42; 32]);
        assert_eq!(h.short(), "42424242");
    }
}

//! Account and contract addresses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 20-byte account address, derived from the Keccak-256 of a public key.
///
/// Contract addresses share the same representation; system contracts are
/// distinguished by a zero leading byte (they run on mediators instead of a
/// jury).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address([u8; 20]);

impl Default for Address {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Address {
    pub const ZERO: Self = Self([0u8; 20]);

    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Parse the `P`-prefixed hex form produced by [`fmt::Display`].
    pub fn from_str_form(s: &str) -> Result<Self, crate::PtnError> {
        let hex_part = s
            .strip_prefix('P')
            .ok_or_else(|| crate::PtnError::InvalidAddress(s.to_string()))?;
        let bytes =
            hex::decode(hex_part).map_err(|_| crate::PtnError::InvalidAddress(s.to_string()))?;
        let arr: [u8; 20] = bytes
            .try_into()
            .map_err(|_| crate::PtnError::InvalidAddress(s.to_string()))?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(P{}\u{2026})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_string_form() {
        let addr = Address::new([7u8; 20]);
        let s = addr.to_string();
        assert!(s.starts_with('P'));
        assert_eq!(Address::from_str_form(&s).unwrap(), addr);
    }

    #[test]
    fn rejects_missing_prefix() {
        assert!(Address::from_str_form("0707").is_err());
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(Address::from_str_form("P0707").is_err());
    }
}

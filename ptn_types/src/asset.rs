//! Asset identifiers for the multi-token UTXO model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one token type on one chain.
///
/// The gas asset (`PTN`) pays transaction fees and is the only asset the fee
/// floor is denominated in.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    /// Token family identifier.
    pub asset_id: [u8; 16],
    /// Distinguishes non-fungible instances; zero for fungible tokens.
    pub unique_id: [u8; 16],
    /// Chain the asset lives on.
    pub chain_id: u64,
}

const PTN_ID: [u8; 16] = *b"PTN\0\0\0\0\0\0\0\0\0\0\0\0\0";

impl Asset {
    /// The gas asset.
    pub fn ptn() -> Self {
        Self {
            asset_id: PTN_ID,
            unique_id: [0u8; 16],
            chain_id: 1,
        }
    }

    pub fn new(asset_id: [u8; 16], unique_id: [u8; 16], chain_id: u64) -> Self {
        Self {
            asset_id,
            unique_id,
            chain_id,
        }
    }

    /// Whether this is the gas asset.
    pub fn is_gas(&self) -> bool {
        self.asset_id == PTN_ID && self.unique_id == [0u8; 16]
    }
}

impl Default for Asset {
    fn default() -> Self {
        Self::ptn()
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_gas() {
            write!(f, "Asset(PTN)")
        } else {
            write!(
                f,
                "Asset({}+{}@{})",
                hex::encode(self.asset_id),
                hex::encode(self.unique_id),
                self.chain_id
            )
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_gas() {
            f.write_str("PTN")
        } else {
            write!(f, "{}+{}", hex::encode(self.asset_id), self.chain_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ptn_is_gas() {
        assert!(Asset::ptn().is_gas());
    }

    #[test]
    fn other_asset_is_not_gas() {
        let a = Asset::new([9u8; 16], [0u8; 16], 1);
        assert!(!a.is_gas());
    }

    #[test]
    fn unique_instance_of_ptn_family_is_not_gas() {
        let mut a = Asset::ptn();
        a.unique_id = [1u8; 16];
        assert!(!a.is_gas());
    }
}

//! Unspent transaction output.

use crate::{Asset, OutPoint};
use serde::{Deserialize, Serialize};

/// One unspent output.
///
/// Created when the unit containing its transaction is accepted, destroyed
/// when a committed payment input references it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub amount: u64,
    /// Locking script: the 20-byte address of the owner.
    pub pk_script: Vec<u8>,
    pub asset: Asset,
    /// The outpoint that created this output.
    pub origin: OutPoint,
}

impl Utxo {
    pub fn new(amount: u64, pk_script: Vec<u8>, asset: Asset, origin: OutPoint) -> Self {
        Self {
            amount,
            pk_script,
            asset,
            origin,
        }
    }
}

//! Outpoint: fully identifies one transaction output.

use crate::Hash;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a single output of a committed transaction.
///
/// A transaction is a list of messages, and a payment message holds a list of
/// outputs, so both indices are needed to pin down one UTXO.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutPoint {
    pub tx_hash: Hash,
    /// Index of the payment message inside the transaction.
    pub message_index: u32,
    /// Index of the output inside that payment message.
    pub out_index: u32,
}

impl OutPoint {
    pub fn new(tx_hash: Hash, message_index: u32, out_index: u32) -> Self {
        Self {
            tx_hash,
            message_index,
            out_index,
        }
    }
}

impl fmt::Debug for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OutPoint({}:{}:{})",
            self.tx_hash.short(),
            self.message_index,
            self.out_index
        )
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.tx_hash, self.message_index, self.out_index
        )
    }
}

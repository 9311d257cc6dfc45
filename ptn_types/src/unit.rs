//! Units: the DAG's blocks, produced one per slot by the scheduled mediator.

use crate::{Address, Hash, Timestamp, Transaction};
use serde::{Deserialize, Serialize};

/// Unit header.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Header {
    pub hash: Hash,
    pub parent_hash: Hash,
    /// Unit index on the main chain; 0 is genesis (no producer).
    pub number: u64,
    pub timestamp: Timestamp,
    /// The mediator that sealed this unit. Zero for genesis.
    pub author: Address,
}

/// A sealed unit: header plus the transactions it commits.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Unit {
    pub header: Header,
    pub transactions: Vec<Transaction>,
}

impl Unit {
    pub fn new(header: Header, transactions: Vec<Transaction>) -> Self {
        Self {
            header,
            transactions,
        }
    }

    pub fn hash(&self) -> Hash {
        self.header.hash
    }

    pub fn number(&self) -> u64 {
        self.header.number
    }

    pub fn parent_hash(&self) -> Hash {
        self.header.parent_hash
    }

    pub fn timestamp(&self) -> Timestamp {
        self.header.timestamp
    }

    pub fn author(&self) -> Address {
        self.header.author
    }
}

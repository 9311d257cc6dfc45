//! Read access to committed units, used by the mempool's reorg walk.

use parking_lot::RwLock;
use ptn_types::{Hash, Unit};
use std::collections::{HashMap, HashSet};

/// Read-only view of the unit DAG's main chain.
pub trait ChainQuery: Send + Sync {
    fn unit_by_hash(&self, hash: &Hash) -> Option<Unit>;
    fn head_unit(&self) -> Option<Unit>;
}

/// Lookup of already-committed transactions.
pub trait TxQuery: Send + Sync {
    fn contains_tx(&self, hash: &Hash) -> bool;
}

/// In-memory unit index.
#[derive(Default)]
pub struct MemoryChain {
    inner: RwLock<MemoryChainInner>,
}

#[derive(Default)]
struct MemoryChainInner {
    units: HashMap<Hash, Unit>,
    txs: HashSet<Hash>,
    head: Option<Hash>,
}

impl MemoryChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a unit; does not move the head.
    pub fn insert(&self, unit: Unit) {
        let mut inner = self.inner.write();
        for tx in &unit.transactions {
            inner.txs.insert(tx.hash());
        }
        inner.units.insert(unit.hash(), unit);
    }

    /// Insert a unit and make it the head.
    pub fn insert_head(&self, unit: Unit) {
        let hash = unit.hash();
        self.insert(unit);
        self.inner.write().head = Some(hash);
    }

    pub fn set_head(&self, hash: Hash) {
        self.inner.write().head = Some(hash);
    }
}

impl TxQuery for MemoryChain {
    fn contains_tx(&self, hash: &Hash) -> bool {
        self.inner.read().txs.contains(hash)
    }
}

impl ChainQuery for MemoryChain {
    fn unit_by_hash(&self, hash: &Hash) -> Option<Unit> {
        self.inner.read().units.get(hash).cloned()
    }

    fn head_unit(&self) -> Option<Unit> {
        let inner = self.inner.read();
        inner.head.and_then(|h| inner.units.get(&h).cloned())
    }
}

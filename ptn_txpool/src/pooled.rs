//! A transaction as tracked inside the pool.

use ptn_types::{Address, Hash, Timestamp, Transaction};

/// Pool-side wrapper: the transaction plus everything admission computed.
#[derive(Clone, Debug)]
pub struct PooledTx {
    pub tx: Transaction,
    /// Full transaction hash.
    pub hash: Hash,
    /// Request hash, the pool's key, shared by a request and its result.
    pub request_hash: Hash,
    /// Sender derived from the first input's unlock script.
    pub from: Address,
    /// Fee in the gas asset, resolved at admission time.
    pub fee: u64,
    /// Serialized size in bytes.
    pub size: usize,
    pub creation: Timestamp,
    /// Arrival order, used as the priority tie-breaker.
    pub sequence: u64,
    /// Whether the entry sits in the executable (pending) set.
    pub pending: bool,
}

const SECS_PER_DAY: f64 = 86_400.0;

impl PooledTx {
    /// Retrieval priority: `fee / size × (1 + age_in_days)`.
    ///
    /// Fee dominates for fresh transactions; age gradually lifts stragglers
    /// so they are not starved forever.
    pub fn priority(&self, now: Timestamp) -> f64 {
        if self.size == 0 {
            return 0.0;
        }
        let age_days = self.creation.elapsed_since(now) as f64 / SECS_PER_DAY;
        self.fee as f64 / self.size as f64 * (1.0 + age_days)
    }
}

//! Per-request processor records.

use crate::ElectionInfo;
use ptn_types::{SignatureEntry, Timestamp, Transaction};
use std::collections::HashMap;

/// Signatures collected from a cross-chain adapter, keyed by slot.
#[derive(Clone, Debug, Default)]
pub struct AdapterInfo {
    pub sig_set: Vec<SignatureEntry>,
}

/// State of one contract request, keyed by its request id.
///
/// Invariants: `rst_tx` is set at most once; `sig_tx` only exists for user
/// contracts; once `rst_tx` is set the record is frozen except for GC.
#[derive(Clone, Debug)]
pub struct ContractRecord {
    /// The request-only view of the transaction.
    pub req_tx: Transaction,
    /// The committed result, once aggregation finishes.
    pub rst_tx: Option<Transaction>,
    /// The locally-executed, locally-signed result (user contracts).
    pub sig_tx: Option<Transaction>,
    /// Signed results received before local execution finished.
    pub rcv_tx: Vec<Transaction>,
    /// The election outcome this node acts under.
    pub ele_inf: Vec<ElectionInfo>,
    /// Adapter signature sets, keyed by adapter slot.
    pub adapter_inf: HashMap<u32, AdapterInfo>,
    /// First-arrival latch for EXEC events.
    pub req_received: bool,
    /// False marks the record for the next GC sweep.
    pub valid: bool,
    pub created_at: Timestamp,
}

impl ContractRecord {
    pub fn new(req_tx: Transaction, now: Timestamp) -> Self {
        Self {
            req_tx,
            rst_tx: None,
            sig_tx: None,
            rcv_tx: Vec::new(),
            ele_inf: Vec::new(),
            adapter_inf: HashMap::new(),
            req_received: false,
            valid: true,
            created_at: now,
        }
    }

    /// Whether a received signed result is already buffered.
    pub fn has_received(&self, tx: &Transaction) -> bool {
        let hash = tx.hash();
        self.rcv_tx.iter().any(|t| t.hash() == hash)
    }
}

/// Per-request election accumulation.
#[derive(Clone, Debug)]
pub struct ElectionRecord {
    /// Candidates received from peers.
    pub rcv_ele: Vec<ElectionInfo>,
    /// Their proofs as signature entries.
    pub sigs: Vec<SignatureEntry>,
    /// Set once the request enters execution; late candidates are dropped.
    pub invalid: bool,
    pub created_at: Timestamp,
}

impl ElectionRecord {
    pub fn new(now: Timestamp) -> Self {
        Self {
            rcv_ele: Vec::new(),
            sigs: Vec::new(),
            invalid: false,
            created_at: now,
        }
    }
}

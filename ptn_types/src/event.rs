//! Chain-level events observed by the mempool and other subscribers.

use crate::{Transaction, Unit};

/// A new head unit was accepted (possibly reorging the previous head).
#[derive(Clone, Debug)]
pub struct ChainHeadEvent {
    pub unit: Unit,
}

/// A transaction was admitted to the pool.
#[derive(Clone, Debug)]
pub struct TxPreEvent {
    pub tx: Transaction,
}

/// The maintenance cycle ran: active mediators were refreshed and the VSS
/// protocol should start.
#[derive(Clone, Debug)]
pub struct ChainMaintainEvent;

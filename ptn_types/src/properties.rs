//! Chain-wide consensus state: global properties, dynamic properties,
//! mediator schedule and per-mediator records.

use crate::{Address, ChainParameters, Hash, Timestamp};
use serde::{Deserialize, Serialize};

/// Slow-moving consensus parameters, refreshed at maintenance time.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GlobalProperty {
    /// The currently elected block producers.
    pub active_mediators: Vec<Address>,
    pub chain_parameters: ChainParameters,
}

impl GlobalProperty {
    pub fn new(active_mediators: Vec<Address>, chain_parameters: ChainParameters) -> Self {
        Self {
            active_mediators,
            chain_parameters,
        }
    }

    pub fn active_count(&self) -> usize {
        self.active_mediators.len()
    }

    /// Supermajority threshold: more than two thirds of the active set.
    pub fn threshold(&self) -> usize {
        self.active_mediators.len() * 2 / 3 + 1
    }

    pub fn is_active_mediator(&self, addr: &Address) -> bool {
        self.active_mediators.contains(addr)
    }
}

/// Fast-moving chain state, updated on every accepted unit.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DynamicGlobalProperty {
    pub head_unit_num: u64,
    pub head_unit_hash: Hash,
    pub head_unit_time: Timestamp,
    /// Absolute slot number of the head unit since genesis.
    pub current_absolute_slot: u64,
    /// Highest unit confirmed by more than two thirds of active mediators.
    /// Monotonically non-decreasing.
    pub last_irreversible_unit_num: u64,
    /// Unix time of the next maintenance cycle.
    pub next_maintenance_time: u64,
}

/// The shuffled producer order for the current shuffle epoch.
///
/// Valid for the next `|active_mediators|` slots, then reshuffled.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MediatorSchedule {
    pub current_shuffled_mediators: Vec<Address>,
}

/// Per-mediator production record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mediator {
    pub address: Address,
    /// Slots this mediator was scheduled for but did not produce.
    pub total_missed: u64,
    /// Number of the latest unit this mediator produced.
    pub last_confirmed_unit_num: u64,
}

impl Mediator {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            total_missed: 0,
            last_confirmed_unit_num: 0,
        }
    }
}

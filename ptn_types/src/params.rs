//! Consensus chain parameters.

use serde::{Deserialize, Serialize};

/// Parameters fixed at genesis and adjusted through on-chain governance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParameters {
    /// Seconds between producer slots.
    pub mediator_interval: u64,
    /// Seconds between chain maintenance cycles (election tally + VSS).
    pub maintenance_interval: u64,
}

impl Default for ChainParameters {
    fn default() -> Self {
        Self {
            mediator_interval: 3,
            maintenance_interval: 86_400,
        }
    }
}

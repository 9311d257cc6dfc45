//! Transaction pool configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Configuration parameters of the transaction pool.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TxPoolConfig {
    /// Whether local-sender privileges are disabled.
    #[serde(default)]
    pub no_locals: bool,

    /// Journal of local transactions surviving restarts; `None` disables it.
    #[serde(default)]
    pub journal: Option<PathBuf>,

    /// Seconds between journal rotations (minimum 1).
    #[serde(default = "default_rejournal_secs")]
    pub rejournal_secs: u64,

    /// Minimum fee to enforce for acceptance into the pool.
    #[serde(default = "default_fee_limit")]
    pub fee_limit: u64,

    /// Minimum price bump percentage to replace an already pooled request.
    #[serde(default = "default_price_bump")]
    pub price_bump: u64,

    /// Executable transaction slots guaranteed per account.
    #[serde(default = "default_account_slots")]
    pub account_slots: u64,

    /// Maximum executable transaction slots across all accounts.
    #[serde(default = "default_global_slots")]
    pub global_slots: u64,

    /// Non-executable slots permitted per account.
    #[serde(default = "default_account_queue")]
    pub account_queue: u64,

    /// Maximum non-executable slots across all accounts.
    #[serde(default = "default_global_queue")]
    pub global_queue: u64,

    /// Seconds a transaction may idle without an account heartbeat.
    #[serde(default = "default_lifetime_secs")]
    pub lifetime_secs: u64,
}

fn default_rejournal_secs() -> u64 {
    3600
}

fn default_fee_limit() -> u64 {
    1
}

fn default_price_bump() -> u64 {
    10
}

fn default_account_slots() -> u64 {
    16
}

fn default_global_slots() -> u64 {
    4096
}

fn default_account_queue() -> u64 {
    64
}

fn default_global_queue() -> u64 {
    1024
}

fn default_lifetime_secs() -> u64 {
    3 * 3600
}

impl Default for TxPoolConfig {
    fn default() -> Self {
        Self {
            no_locals: false,
            journal: None,
            rejournal_secs: default_rejournal_secs(),
            fee_limit: default_fee_limit(),
            price_bump: default_price_bump(),
            account_slots: default_account_slots(),
            global_slots: default_global_slots(),
            account_queue: default_account_queue(),
            global_queue: default_global_queue(),
            lifetime_secs: default_lifetime_secs(),
        }
    }
}

impl TxPoolConfig {
    /// Clamp unworkable user values to sane ones, logging each adjustment.
    pub fn sanitize(mut self) -> Self {
        if self.rejournal_secs < 1 {
            warn!(provided = self.rejournal_secs, updated = 1, "sanitizing invalid txpool journal time");
            self.rejournal_secs = 1;
        }
        if self.price_bump < 1 {
            warn!(
                provided = self.price_bump,
                updated = default_price_bump(),
                "sanitizing invalid txpool price bump"
            );
            self.price_bump = default_price_bump();
        }
        self
    }

    pub fn rejournal(&self) -> Duration {
        Duration::from_secs(self.rejournal_secs)
    }

    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.lifetime_secs)
    }

    /// Total pool capacity across both executable and queued slots.
    pub fn capacity(&self) -> u64 {
        self.global_slots + self.global_queue
    }
}

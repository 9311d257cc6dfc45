//! Top-level error type shared across crates.

use thiserror::Error;

/// Common error type for the PTN ledger core.
#[derive(Debug, Error)]
pub enum PtnError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("referenced output {0} not found")]
    UtxoNotFound(String),

    #[error("outputs exceed inputs: {inputs} in, {outputs} out")]
    NegativeFee { inputs: u64, outputs: u64 },

    #[error("duplicate transaction hash")]
    DuplicateTransaction,

    #[error("transaction oversized: {size} > {max}")]
    Oversized { size: usize, max: usize },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("{0}")]
    Other(String),
}

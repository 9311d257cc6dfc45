//! Pool admission errors.

use ptn_validator::ValidationCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TxPoolError {
    /// The exact transaction is already pooled.
    #[error("already have transaction {0}")]
    Known(String),

    /// An input is already spent by a different pooled transaction.
    #[error("output {outpoint} already spent by transaction {spender} in the memory pool")]
    DoubleSpend { outpoint: String, spender: String },

    /// Validation pipeline rejection.
    #[error("transaction invalid: {0}")]
    Invalid(ValidationCode),

    /// Fee below the pool's configured floor.
    #[error("txfee too low")]
    FeeTooLow,

    /// Below the floor of the priced list while the pool is full.
    #[error("transaction underpriced")]
    Underpriced,

    /// Replacement did not clear the price bump.
    #[error("replacement transaction underpriced")]
    ReplaceUnderpriced,

    #[error("journal error: {0}")]
    Journal(#[from] std::io::Error),

    #[error("journal serialization error: {0}")]
    Serialization(String),
}

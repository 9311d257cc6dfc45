//! Validation result codes.

use std::fmt;

/// Outcome of validating one transaction.
///
/// These are expected results, not faults: duplicate and already-spent
/// transactions are normal network noise. Operational failures (storage I/O,
/// crypto backend errors) propagate as errors instead and never appear here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationCode {
    Valid,
    /// Empty message list, or message 0 is not a payment.
    InvalidMsg,
    /// The transaction is already committed.
    DuplicateTxId,
    /// Fee could not be computed or is below the configured floor.
    InvalidFee,
    /// Serialized size exceeds the 256 KiB cap.
    NotCompareSize,
    /// A payment input script or signature entry failed verification.
    BadCreatorSignature,
    /// A payment payload references missing or double-spent outputs, or its
    /// per-asset sums do not balance.
    InvalidPaymentload,
    /// A contract request or result payload is malformed or inconsistent
    /// with the current state.
    InvalidContract,
    /// A data payload carries no data.
    InvalidDataPayload,
    /// The payload could not be decoded as any known message type.
    UnknownTxType,
}

impl ValidationCode {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationCode::Valid)
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValidationCode::Valid => "VALID",
            ValidationCode::InvalidMsg => "INVALID_MSG",
            ValidationCode::DuplicateTxId => "DUPLICATE_TXID",
            ValidationCode::InvalidFee => "INVALID_FEE",
            ValidationCode::NotCompareSize => "NOT_COMPARE_SIZE",
            ValidationCode::BadCreatorSignature => "BAD_CREATOR_SIGNATURE",
            ValidationCode::InvalidPaymentload => "INVALID_PAYMENTLOAD",
            ValidationCode::InvalidContract => "INVALID_CONTRACT",
            ValidationCode::InvalidDataPayload => "INVALID_DATA_PAYLOAD",
            ValidationCode::UnknownTxType => "UNKNOWN_TX_TYPE",
        };
        f.write_str(name)
    }
}

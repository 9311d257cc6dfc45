use thiserror::Error;

#[derive(Debug, Error)]
pub enum JuryError {
    #[error("event transaction is invalid: {0}")]
    InvalidTx(String),

    #[error("no local account configured")]
    NoLocalAccounts,

    #[error("no signing key for account {0}")]
    SignerMissing(String),

    #[error("contract execution timed out")]
    ExecTimeout,

    #[error("contract execution failed: {0}")]
    ExecFailed(String),

    #[error("received transaction does not match the local result")]
    TxMismatch,

    #[error("election candidate carries an invalid proof")]
    InvalidElectionProof,

    #[error(transparent)]
    Crypto(#[from] ptn_types::PtnError),

    #[error(transparent)]
    Pool(#[from] ptn_txpool::TxPoolError),
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] ptn_store::StoreError),

    #[error(transparent)]
    Schedule(#[from] ptn_schedule::ScheduleError),

    #[error(transparent)]
    Pool(#[from] ptn_txpool::TxPoolError),

    #[error(transparent)]
    Jury(#[from] ptn_jury::JuryError),

    /// Mediator API rejections, surfaced verbatim to the RPC caller.
    #[error("{0}")]
    Mediator(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

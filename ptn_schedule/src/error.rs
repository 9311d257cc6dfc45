use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("no active mediators")]
    NoActiveMediators,

    #[error("unit {0} claims an already-produced slot")]
    DoubleProducedSlot(u64),

    #[error(transparent)]
    Store(#[from] ptn_store::StoreError),
}

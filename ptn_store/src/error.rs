use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("global property not initialized")]
    MissingGlobalProperty,

    #[error("dynamic global property not initialized")]
    MissingDynamicGlobalProperty,

    #[error("mediator schedule not initialized")]
    MissingMediatorSchedule,

    #[error("mediator {0} not found")]
    MediatorNotFound(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

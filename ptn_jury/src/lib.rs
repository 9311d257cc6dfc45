//! Jury contract processor.
//!
//! Drives a contract request through election, execution, signature
//! aggregation and commit. Per-request state is serialized under a single
//! mutex; the sandbox runs outside it and its results re-enter the machine
//! through the signature path.

pub mod error;
pub mod event;
pub mod executor;
pub mod keystore;
pub mod processor;
pub mod record;

pub use error::JuryError;
pub use event::{
    ContractEvent, ContractEventType, ElectionEvent, ElectionInfo, ElectionRequestEvent,
    ElectionResultEvent,
};
pub use executor::{ContractExecutor, ExecutorPool};
pub use keystore::KeyStore;
pub use processor::{run_gc, JuryConfig, Processor};

//! PTN full node: wires the validator, mempool, scheduler and contract
//! processor together behind one configuration and shutdown story.

pub mod config;
pub mod error;
pub mod logging;
pub mod mediator_api;
pub mod node;
pub mod shutdown;

pub use config::NodeConfig;
pub use error::NodeError;
pub use logging::{init_logging, request_span, unit_span, LogFormat};
pub use mediator_api::{MediatorApi, TxExecuteResult, DEFAULT_RESULT};
pub use node::Node;
pub use shutdown::{DrainGuard, ShutdownController};

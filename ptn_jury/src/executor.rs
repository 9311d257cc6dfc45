//! The sandbox seam and its bounded dispatch pool.

use crate::JuryError;
use ptn_types::{Message, Transaction};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Black-box contract sandbox.
///
/// Implementations run the request's contract command (install, deploy,
/// invoke or stop) and return the result messages to append to the request.
/// The processor never interprets the execution itself.
pub trait ContractExecutor: Send + Sync + 'static {
    fn run(&self, request: &Transaction) -> Result<Vec<Message>, JuryError>;
}

/// Bounded dispatcher for sandbox invocations.
///
/// Executions run on blocking worker threads, at most `max_concurrent` at a
/// time; an invocation that outlives `timeout` fails with
/// [`JuryError::ExecTimeout`] and its eventual result is discarded.
pub struct ExecutorPool {
    executor: Arc<dyn ContractExecutor>,
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl ExecutorPool {
    pub fn new(executor: Arc<dyn ContractExecutor>, max_concurrent: usize, timeout: Duration) -> Self {
        Self {
            executor,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            timeout,
        }
    }

    pub async fn run(&self, request: Transaction) -> Result<Vec<Message>, JuryError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| JuryError::ExecFailed("executor pool closed".into()))?;

        let executor = Arc::clone(&self.executor);
        let handle = tokio::task::spawn_blocking(move || executor.run(&request));

        match tokio::time::timeout(self.timeout, handle).await {
            Err(_) => Err(JuryError::ExecTimeout),
            Ok(Err(join_err)) => Err(JuryError::ExecFailed(join_err.to_string())),
            Ok(Ok(result)) => result,
        }
    }
}

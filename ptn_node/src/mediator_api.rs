//! Mediator registration and roster queries, as exposed by the RPC façade.

use crate::NodeError;
use ptn_store::{ChainState, PropertyStore};
use ptn_txpool::TxPool;
use ptn_types::{Hash, MediatorCreateOperation, Message, Transaction};
use std::sync::Arc;

/// Standing caveat attached to every locally-executed transaction.
pub const DEFAULT_RESULT: &str =
    "Transaction executed locally, but may not be confirmed by the network yet!";

/// Outcome of a mediator API transaction.
#[derive(Clone, Debug)]
pub struct TxExecuteResult {
    pub tx_content: String,
    pub tx_hash: Hash,
    pub tx_size: String,
    pub tx_fee: String,
    pub warning: String,
}

/// Mediator queries and the registration path.
pub struct MediatorApi {
    state: Arc<dyn ChainState>,
    props: Arc<dyn PropertyStore>,
}

impl MediatorApi {
    pub fn new(state: Arc<dyn ChainState>, props: Arc<dyn PropertyStore>) -> Self {
        Self { state, props }
    }

    /// Addresses of the currently active mediators.
    pub fn get_actives(&self) -> Result<Vec<String>, NodeError> {
        let gp = self.props.global_prop()?;
        Ok(gp
            .active_mediators
            .iter()
            .map(|a| a.to_string())
            .collect())
    }

    /// Unix time of the next maintenance cycle.
    pub fn next_update_time(&self) -> Result<u64, NodeError> {
        Ok(self.props.dyn_global_prop()?.next_maintenance_time)
    }

    /// Register a new mediator.
    ///
    /// `build_tx` is the wallet collaborator's hook: it funds and signs a
    /// transaction carrying the given registration message. The signed
    /// result enters the local pool.
    pub async fn create<F>(
        &self,
        args: MediatorCreateOperation,
        fee: u64,
        build_tx: F,
        pool: &TxPool,
    ) -> Result<TxExecuteResult, NodeError>
    where
        F: FnOnce(Message) -> Result<Transaction, NodeError>,
    {
        if self.state.is_mediator(&args.account) {
            return Err(NodeError::Mediator(format!(
                "account {} is already a mediator",
                args.account
            )));
        }
        if !self.state.deposit_paid(&args.account) {
            return Err(NodeError::Mediator(
                "has not successfully paid the deposit".to_string(),
            ));
        }

        let content = format!(
            "Create mediator {} with initPubKey : {} , node: {} , url: {}",
            args.account, args.init_pub_key, args.node, args.url
        );
        let tx = build_tx(Message::MediatorCreate(args))?;
        let tx_hash = tx.hash();
        let tx_size = format!("{} B", tx.size());

        pool.add_local(tx).await?;

        Ok(TxExecuteResult {
            tx_content: content,
            tx_hash,
            tx_size,
            tx_fee: format!("{fee}dao"),
            warning: DEFAULT_RESULT.to_string(),
        })
    }
}

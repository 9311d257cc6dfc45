//! Node wiring: builds every subsystem against shared in-memory stores and
//! runs the background loops under one shutdown controller.

use crate::{NodeConfig, NodeError, ShutdownController};
use ptn_jury::{run_gc, ContractExecutor, KeyStore, Processor};
use ptn_schedule::{shuffle_mediators, ChainMaintainer, UnitOutcome};
use ptn_store::{
    ChainState, MemoryChain, MemoryPropertyDb, MemoryState, PropertyStore, UtxoView,
};
use ptn_txpool::{run_loop, TxPool};
use ptn_types::{
    Address, ChainHeadEvent, ChainMaintainEvent, ChainParameters, DynamicGlobalProperty,
    GlobalProperty, MediatorSchedule, Timestamp, Unit,
};
use ptn_utils::Feed;
use ptn_validator::Validate;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn, Instrument};

/// A wired PTN node over in-memory storage.
pub struct Node {
    pub chain: Arc<MemoryChain>,
    pub utxo: Arc<UtxoView>,
    pub state: Arc<MemoryState>,
    pub props: Arc<MemoryPropertyDb>,
    pub keystore: Arc<KeyStore>,
    pub pool: Arc<TxPool>,
    pub processor: Arc<Processor>,
    pub maintainer: ChainMaintainer,
    shutdown: ShutdownController,
    head_feed: Feed<ChainHeadEvent>,
    maintain_feed: Feed<ChainMaintainEvent>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Node {
    /// Assemble a node from its configuration and sandbox executor.
    pub fn new(config: NodeConfig, executor: Arc<dyn ContractExecutor>) -> Self {
        let chain = Arc::new(MemoryChain::new());
        let utxo = Arc::new(UtxoView::new());
        let state = Arc::new(MemoryState::new());
        let props = Arc::new(MemoryPropertyDb::new());
        let keystore = Arc::new(KeyStore::new());

        let processor = Processor::new(
            config.jury.to_jury_config(),
            state.clone() as Arc<dyn ChainState>,
            keystore.clone(),
            executor,
        );

        let validator = Validate::new(utxo.clone(), chain.clone(), Some(state.clone()));
        let predicate = {
            let processor = processor.clone();
            Box::new(move |tx: &ptn_types::Transaction| processor.node_contract_executable(tx))
        };
        let pool = Arc::new(TxPool::new(
            config.txpool.clone(),
            validator,
            utxo.clone(),
            chain.clone(),
            predicate,
        ));

        let maintainer = ChainMaintainer::new(props.clone(), props.clone());

        Self {
            chain,
            utxo,
            state,
            props,
            keystore,
            pool,
            processor,
            maintainer,
            shutdown: ShutdownController::new(),
            head_feed: Feed::new(),
            maintain_feed: Feed::new(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Seed the genesis state: the active roster, its first shuffle, and
    /// the genesis unit.
    pub fn init_genesis(
        &self,
        mediators: Vec<Address>,
        params: ChainParameters,
        genesis_time: Timestamp,
    ) -> Result<(), NodeError> {
        let gp = GlobalProperty::new(mediators, params);
        let dgp = DynamicGlobalProperty {
            head_unit_num: 0,
            head_unit_hash: ptn_types::Hash::ZERO,
            head_unit_time: genesis_time,
            current_absolute_slot: 0,
            last_irreversible_unit_num: 0,
            next_maintenance_time: 0,
        };
        let mut schedule = MediatorSchedule::default();
        shuffle_mediators(&mut schedule, &gp, 0, genesis_time);
        self.props.seed(gp.clone(), dgp, schedule);

        for addr in &gp.active_mediators {
            self.state.add_active_mediator(*addr);
        }

        let genesis = Unit::new(
            ptn_types::Header {
                hash: ptn_types::Hash::ZERO,
                parent_hash: ptn_types::Hash::ZERO,
                number: 0,
                timestamp: genesis_time,
                author: Address::ZERO,
            },
            vec![],
        );
        self.chain.insert_head(genesis);
        Ok(())
    }

    /// Spawn the background loops (pool event loop, contract GC), each
    /// tracked until it drains on shutdown.
    pub async fn start(&self) {
        let mut tasks = self.tasks.lock().await;

        let pool_guard = self.shutdown.track("txpool");
        let pool_loop = run_loop(
            self.pool.clone(),
            self.head_feed.subscribe(16),
            self.shutdown.subscribe(),
        );
        tasks.push(tokio::spawn(async move {
            pool_loop.await;
            drop(pool_guard);
        }));

        let gc_guard = self.shutdown.track("contract-gc");
        let gc_loop = run_gc(self.processor.clone(), self.shutdown.subscribe());
        tasks.push(tokio::spawn(async move {
            gc_loop.await;
            drop(gc_guard);
        }));

        info!("node started");
    }

    /// Accept a sealed unit: apply its transactions to the UTXO view, run
    /// the consensus bookkeeping and fan the head event out.
    pub async fn accept_unit(&self, unit: Unit) -> Result<UnitOutcome, NodeError> {
        let span = crate::logging::unit_span(unit.number(), &unit.hash());
        async {
            for tx in &unit.transactions {
                self.utxo.spend_tx_inputs(tx);
                self.utxo.add_tx_outputs(tx);
            }
            self.chain.insert_head(unit.clone());

            let outcome = self.maintainer.accept_unit(&unit)?;
            if outcome.maintenance_ran {
                self.maintain_feed.send(ChainMaintainEvent).await;
            }
            self.head_feed.send(ChainHeadEvent { unit }).await;
            Ok(outcome)
        }
        .instrument(span)
        .await
    }

    /// Submit a locally-built contract request, logging its lifecycle under
    /// the request span.
    pub async fn submit_request(
        &self,
        tx: ptn_types::Transaction,
    ) -> Result<ptn_types::Hash, NodeError> {
        let span = crate::logging::request_span(&tx.request_hash());
        async { Ok(self.processor.broadcast_request(tx).await?) }
            .instrument(span)
            .await
    }

    pub fn subscribe_chain_head(&self, capacity: usize) -> mpsc::Receiver<ChainHeadEvent> {
        self.head_feed.subscribe(capacity)
    }

    pub fn subscribe_maintenance(&self, capacity: usize) -> mpsc::Receiver<ChainMaintainEvent> {
        self.maintain_feed.subscribe(capacity)
    }

    /// The next scheduled producer, per the current shuffle.
    pub fn scheduled_mediator(&self, slot_offset: u64) -> Result<Option<Address>, NodeError> {
        let ms = self.props.mediator_schedule()?;
        let dgp = self.props.dyn_global_prop()?;
        Ok(ptn_schedule::scheduled_mediator(&ms, &dgp, slot_offset))
    }

    /// Broadcast shutdown, wait for the loops to drain, and join them.
    pub async fn stop(&self) {
        self.shutdown.shutdown();
        if !self.shutdown.join(Duration::from_secs(5)).await {
            warn!("abandoning subsystems that did not drain in time");
        }
        self.head_feed.close();
        self.maintain_feed.close();
        let mut tasks = self.tasks.lock().await;
        for task in tasks.drain(..) {
            let _ = task.await;
        }
        info!("node stopped");
    }
}

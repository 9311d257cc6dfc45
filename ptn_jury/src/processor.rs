//! The contract processor state machine.
//!
//! Keyed by request id, every request walks election → execution →
//! signature aggregation → commit. All transitions for one request are
//! totally ordered by the processor mutex; sandbox executions run outside
//! it and re-enter through the signature path.

use crate::event::{
    ContractEvent, ContractEventType, ElectionEvent, ElectionInfo, ElectionRequestEvent,
    ElectionResultEvent,
};
use crate::record::{AdapterInfo, ContractRecord, ElectionRecord};
use crate::{ContractExecutor, ExecutorPool, JuryError, KeyStore};
use ptn_crypto::{keccak256, verify_signature};
use ptn_store::ChainState;
use ptn_txpool::TxPool;
use ptn_types::{
    Address, Hash, Message, SignatureEntry, SignaturePayload, Timestamp, Transaction,
};
use ptn_utils::Feed;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::{debug, info, warn};

/// Records older than this that never became valid are reaped.
const STALE_AFTER_SECS: u64 = 100;
/// GC sweep cadence.
const GC_INTERVAL: Duration = Duration::from_secs(20);
/// A complete but uncommitted signature set is re-broadcast past this age,
/// covering an offline leader.
const COMMIT_TIMEOUT_SECS: u64 = 60;

/// Processor tunables.
#[derive(Clone, Debug)]
pub struct JuryConfig {
    /// Candidates needed before a jury election is considered complete.
    pub election_num: usize,
    /// Signatures required on a user-contract result.
    pub contract_sig_num: usize,
    /// Sandbox invocations allowed in flight.
    pub max_concurrent_executions: usize,
    /// Per-invocation sandbox time limit.
    pub execution_timeout_secs: u64,
}

impl Default for JuryConfig {
    fn default() -> Self {
        Self {
            election_num: 3,
            contract_sig_num: 3,
            max_concurrent_executions: 4,
            execution_timeout_secs: 30,
        }
    }
}

#[derive(Default)]
struct ProcessorInner {
    /// Request id → contract record.
    mtx: HashMap<Hash, ContractRecord>,
    /// Request id → election record.
    mel: HashMap<Hash, ElectionRecord>,
}

/// The jury contract processor.
pub struct Processor {
    config: JuryConfig,
    state: Arc<dyn ChainState>,
    keystore: Arc<KeyStore>,
    executor: ExecutorPool,
    contract_feed: Feed<ContractEvent>,
    election_feed: Feed<ElectionEvent>,
    inner: Mutex<ProcessorInner>,
    /// Handle to ourselves for dispatching sandbox executions.
    self_ref: Weak<Processor>,
}

impl Processor {
    pub fn new(
        config: JuryConfig,
        state: Arc<dyn ChainState>,
        keystore: Arc<KeyStore>,
        executor: Arc<dyn ContractExecutor>,
    ) -> Arc<Self> {
        let pool = ExecutorPool::new(
            executor,
            config.max_concurrent_executions,
            Duration::from_secs(config.execution_timeout_secs),
        );
        Arc::new_cyclic(|self_ref| Self {
            config,
            state,
            keystore,
            executor: pool,
            contract_feed: Feed::new(),
            election_feed: Feed::new(),
            inner: Mutex::new(ProcessorInner::default()),
            self_ref: self_ref.clone(),
        })
    }

    /// Subscribe to outbound contract events (peer broadcasts).
    pub fn subscribe_contract_events(&self, capacity: usize) -> mpsc::Receiver<ContractEvent> {
        self.contract_feed.subscribe(capacity)
    }

    /// Subscribe to outbound election events.
    pub fn subscribe_election_events(&self, capacity: usize) -> mpsc::Receiver<ElectionEvent> {
        self.election_feed.subscribe(capacity)
    }

    /// Number of tracked requests.
    pub async fn tracked_requests(&self) -> usize {
        self.inner.lock().await.mtx.len()
    }

    /// The committed result for a request, if aggregation finished.
    pub async fn committed_result(&self, req_id: &Hash) -> Option<Transaction> {
        self.inner
            .lock()
            .await
            .mtx
            .get(req_id)
            .and_then(|r| r.rst_tx.clone())
    }

    /// Drive one contract event through the state machine.
    pub async fn process(&self, event: ContractEvent) -> Result<(), JuryError> {
        let req_id = event.tx.request_hash();
        if event.tx.messages.is_empty() {
            return Err(JuryError::InvalidTx(req_id.to_string()));
        }
        if !check_tx_sig_valid(&event.tx) {
            return Err(JuryError::InvalidTx(req_id.to_string()));
        }
        debug!(req = %req_id.short(), ctype = ?event.ctype, "processing contract event");

        let (broadcast, commit) = match event.ctype {
            ContractEventType::Ele => self.ele_event(&event.tx).await?,
            ContractEventType::Exec => self.exec_event(&event.tx, &event.ele).await?,
            ContractEventType::Sig => self.sig_event(&event.tx, &event.ele).await?,
            ContractEventType::Commit => self.commit_event(&event.tx).await?,
        };
        if broadcast {
            self.contract_feed.send(event).await;
        }
        if let Some(commit_event) = commit {
            self.contract_feed.send(commit_event).await;
        }
        Ok(())
    }

    /// Submit a locally-built request: track it, execute if this node may,
    /// and broadcast the EXEC event to peers.
    pub async fn broadcast_request(&self, tx: Transaction) -> Result<Hash, JuryError> {
        let req_id = tx.request_hash();
        let ele = self.local_election_list(&tx);
        self.process(ContractEvent {
            ctype: ContractEventType::Exec,
            tx,
            ele,
        })
        .await?;
        Ok(req_id)
    }

    /// ELE: open the election for a request.
    async fn ele_event(
        &self,
        tx: &Transaction,
    ) -> Result<(bool, Option<ContractEvent>), JuryError> {
        let req_id = tx.request_hash();
        let now = Timestamp::now();
        let eles = self.local_election_list(tx);

        {
            let mut inner = self.inner.lock().await;
            let record = inner
                .mtx
                .entry(req_id)
                .or_insert_with(|| ContractRecord::new(tx.request_view(), now));
            if eles.len() >= self.config.election_num {
                record.ele_inf = eles[..self.config.election_num].to_vec();
            } else if !eles.is_empty() {
                record.ele_inf = eles.clone();
            }
            inner
                .mel
                .entry(req_id)
                .or_insert_with(|| ElectionRecord::new(now));
        }

        // Not enough locally-known candidates: ask peers.
        if eles.len() < self.config.election_num {
            self.election_feed
                .send(ElectionEvent::VrfRequest(ElectionRequestEvent { req_id }))
                .await;
        }
        Ok((false, None))
    }

    /// EXEC: first arrival wins; user contracts go to the sandbox.
    async fn exec_event(
        &self,
        tx: &Transaction,
        ele: &[ElectionInfo],
    ) -> Result<(bool, Option<ContractEvent>), JuryError> {
        let req_id = tx.request_hash();
        let now = Timestamp::now();
        let run = {
            let mut inner = self.inner.lock().await;
            let record = inner
                .mtx
                .entry(req_id)
                .or_insert_with(|| ContractRecord::new(tx.request_view(), now));
            if record.req_received {
                return Ok((false, None));
            }
            record.req_tx = tx.request_view();
            record.ele_inf = ele.to_vec();
            record.req_received = true;
            // Close the election record; late candidates are dropped.
            if let Some(election) = inner.mel.get_mut(&req_id) {
                election.invalid = true;
            }
            // System contracts run during unit construction, not here.
            !tx.is_system_contract() && self.node_contract_executable(tx)
        };
        debug!(req = %req_id.short(), run, "contract request recorded");

        if run {
            if let Some(processor) = self.self_ref.upgrade() {
                let request = tx.request_view();
                let ele = ele.to_vec();
                tokio::spawn(async move {
                    processor.run_contract_request(request, ele).await;
                });
            }
        }
        Ok((true, None))
    }

    /// Sandbox execution, outside the processor mutex. The result re-enters
    /// the machine through the signature path.
    async fn run_contract_request(self: Arc<Self>, request: Transaction, ele: Vec<ElectionInfo>) {
        let req_id = request.request_hash();
        let msgs = match self.executor.run(request.clone()).await {
            Ok(msgs) => msgs,
            Err(err) => {
                warn!(req = %req_id.short(), %err, "contract execution failed");
                let mut inner = self.inner.lock().await;
                if let Some(record) = inner.mtx.get_mut(&req_id) {
                    record.valid = false;
                }
                return;
            }
        };

        let mut result_tx = request.clone();
        for msg in msgs {
            result_tx.add_message(msg);
        }

        if request.is_system_contract() {
            let mut inner = self.inner.lock().await;
            if let Some(record) = inner.mtx.get_mut(&req_id) {
                if record.rst_tx.is_none() {
                    record.rst_tx = Some(result_tx);
                    record.valid = true;
                }
            }
            return;
        }

        // User contract: sign the result with the first local account.
        let Some(addr) = self.keystore.addresses().first().copied() else {
            warn!(req = %req_id.short(), "no local account to sign contract result");
            return;
        };
        let entry = match self.keystore.sign(&addr, &result_tx.result_signing_hash()) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(req = %req_id.short(), %err, "signing contract result failed");
                return;
            }
        };
        result_tx.add_message(Message::Signature(SignaturePayload {
            signatures: vec![entry],
        }));

        let (sig_tx, commit) = {
            let mut inner = self.inner.lock().await;
            // A reaped record means nobody wants this result anymore.
            let Some(record) = inner.mtx.get_mut(&req_id) else {
                debug!(req = %req_id.short(), "discarding result for reaped request");
                return;
            };

            let mut sig_tx = result_tx;
            // Merge results that arrived before execution finished.
            let buffered: Vec<Transaction> = record.rcv_tx.drain(..).collect();
            for rtx in &buffered {
                match check_and_add_sig(&mut sig_tx, rtx) {
                    Ok(added) => debug!(req = %req_id.short(), added, "merged buffered signature"),
                    Err(err) => warn!(req = %req_id.short(), %err, "buffered result mismatch"),
                }
            }
            record.sig_tx = Some(sig_tx.clone());
            let commit = self.try_commit(record, &ele);
            (sig_tx, commit)
        };

        self.contract_feed
            .send(ContractEvent {
                ctype: ContractEventType::Sig,
                tx: sig_tx,
                ele: ele.clone(),
            })
            .await;
        if let Some(commit_event) = commit {
            self.contract_feed.send(commit_event).await;
        }
    }

    /// SIG: fold a peer's signature into the local result; the holder of
    /// the smallest signature commits.
    async fn sig_event(
        &self,
        tx: &Transaction,
        ele: &[ElectionInfo],
    ) -> Result<(bool, Option<ContractEvent>), JuryError> {
        if self.keystore.is_empty() {
            return Err(JuryError::NoLocalAccounts);
        }
        let req_id = tx.request_hash();
        let now = Timestamp::now();
        let mut inner = self.inner.lock().await;

        if let Some(record) = inner.mtx.get(&req_id) {
            if record.has_received(tx) {
                return Ok((false, None));
            }
        } else {
            // Late join: track the request and buffer the signed result.
            let mut record = ContractRecord::new(tx.request_view(), now);
            record.ele_inf = ele.to_vec();
            record.rcv_tx.push(tx.clone());
            inner.mtx.insert(req_id, record);
            debug!(req = %req_id.short(), "sig event for unknown request, record created");
            return Ok((true, None));
        }

        let Some(record) = inner.mtx.get_mut(&req_id) else {
            return Ok((false, None));
        };
        record.rcv_tx.push(tx.clone());

        let mut commit = None;
        if let Some(mut sig_tx) = record.sig_tx.take() {
            match check_and_add_sig(&mut sig_tx, tx) {
                Ok(true) => {
                    record.sig_tx = Some(sig_tx);
                    commit = self.try_commit(record, ele);
                }
                // Duplicate signatures are silently dropped.
                Ok(false) => record.sig_tx = Some(sig_tx),
                Err(err) => {
                    record.sig_tx = Some(sig_tx);
                    return Err(err);
                }
            }
        }
        Ok((true, commit))
    }

    /// If the local signature set is complete and this node holds the
    /// smallest signature, commit locally and produce the COMMIT broadcast.
    fn try_commit(&self, record: &mut ContractRecord, ele: &[ElectionInfo]) -> Option<ContractEvent> {
        let sig_tx = record.sig_tx.as_ref()?;
        if sig_tx.signature_count() < self.config.contract_sig_num {
            return None;
        }
        if !local_is_min_signature(sig_tx) {
            return None;
        }
        if record.rst_tx.is_some() {
            return None;
        }
        info!(req = %record.req_tx.request_hash().short(), "local signature is minimal, committing");
        record.rst_tx = Some(sig_tx.clone());
        record.valid = true;
        Some(ContractEvent {
            ctype: ContractEventType::Commit,
            tx: sig_tx.clone(),
            ele: ele.to_vec(),
        })
    }

    /// COMMIT: adopt the aggregated result; at most once.
    async fn commit_event(
        &self,
        tx: &Transaction,
    ) -> Result<(bool, Option<ContractEvent>), JuryError> {
        let req_id = tx.request_hash();
        let now = Timestamp::now();
        let mut inner = self.inner.lock().await;
        let record = inner
            .mtx
            .entry(req_id)
            .or_insert_with(|| ContractRecord::new(tx.request_view(), now));
        if record.rst_tx.is_some() {
            debug!(req = %req_id.short(), "result already received");
            return Ok((false, None));
        }
        record.valid = true;
        record.rst_tx = Some(tx.clone());
        Ok((true, None))
    }

    /// Handle an election protocol event.
    pub async fn process_election_event(&self, event: ElectionEvent) -> Result<(), JuryError> {
        match event {
            ElectionEvent::VrfRequest(req) => {
                for addr in self.keystore.addresses() {
                    if !self.state.is_active_jury(&addr) {
                        continue;
                    }
                    let entry = self.keystore.sign(&addr, &req.req_id)?;
                    let ele = ElectionInfo {
                        addr_hash: keccak256(addr.as_bytes()),
                        proof: entry.signature.clone(),
                        public_key: entry.pub_key.clone(),
                    };
                    self.election_feed
                        .send(ElectionEvent::VrfResult(ElectionResultEvent {
                            req_id: req.req_id,
                            ele,
                        }))
                        .await;
                }
                Ok(())
            }
            ElectionEvent::VrfResult(res) => {
                if !verify_signature(&res.ele.public_key, &res.ele.proof, res.req_id.as_bytes()) {
                    return Err(JuryError::InvalidElectionProof);
                }
                let now = Timestamp::now();
                let mut inner = self.inner.lock().await;
                let election = inner
                    .mel
                    .entry(res.req_id)
                    .or_insert_with(|| ElectionRecord::new(now));
                if election.invalid {
                    return Ok(());
                }
                if election
                    .rcv_ele
                    .iter()
                    .any(|e| e.public_key == res.ele.public_key)
                {
                    return Ok(());
                }
                election.rcv_ele.push(res.ele.clone());
                election.sigs.push(SignatureEntry {
                    pub_key: res.ele.public_key.clone(),
                    signature: res.ele.proof.clone(),
                });

                // Top up the request's candidate list.
                let election_num = self.config.election_num;
                if let Some(record) = inner.mtx.get_mut(&res.req_id) {
                    if record.ele_inf.len() < election_num
                        && !record
                            .ele_inf
                            .iter()
                            .any(|e| e.public_key == res.ele.public_key)
                    {
                        record.ele_inf.push(res.ele);
                    }
                }
                Ok(())
            }
        }
    }

    /// Merge an adapter signature for one slot; duplicates are dropped.
    pub async fn process_adapter_sig(
        &self,
        req_id: &Hash,
        slot: u32,
        entry: SignatureEntry,
    ) -> bool {
        let mut inner = self.inner.lock().await;
        let Some(record) = inner.mtx.get_mut(req_id) else {
            return false;
        };
        let info = record
            .adapter_inf
            .entry(slot)
            .or_insert_with(AdapterInfo::default);
        if info
            .sig_set
            .iter()
            .any(|s| s.pub_key == entry.pub_key && s.signature == entry.signature)
        {
            return false;
        }
        info.sig_set.push(entry);
        true
    }

    /// Hand committed results to the transaction pool, producer-signed.
    ///
    /// Only results whose signature set clears `2n/3 + 1` of the required
    /// jury size go out; each record is drained at most once.
    pub async fn add_contract_loop(
        &self,
        pool: &TxPool,
        addr: &Address,
    ) -> Result<(), JuryError> {
        let ready: Vec<Transaction> = {
            let mut inner = self.inner.lock().await;
            let mut list = Vec::new();
            for record in inner.mtx.values_mut() {
                if !record.valid {
                    continue;
                }
                let Some(rst) = record.rst_tx.clone() else {
                    continue;
                };
                record.valid = false;
                list.push(rst);
            }
            list
        };

        for mut tx in ready {
            let req_id = tx.request_hash();
            if !check_tx_sig_valid(&tx) {
                warn!(req = %req_id.short(), "committed result has invalid signatures");
                continue;
            }
            if tx.signature_payload().is_some() {
                let required = self.config.contract_sig_num * 2 / 3 + 1;
                if tx.signature_count() < required {
                    warn!(
                        req = %req_id.short(),
                        have = tx.signature_count(),
                        required,
                        "committed result below signature threshold"
                    );
                    continue;
                }
            }
            // Producer endorsement over the final transaction.
            match self.keystore.sign(addr, &tx.result_signing_hash()) {
                Ok(entry) => match tx.signature_payload_mut() {
                    Some(payload) => {
                        if !payload
                            .signatures
                            .iter()
                            .any(|s| s.pub_key == entry.pub_key)
                        {
                            payload.signatures.push(entry);
                        }
                    }
                    None => tx.add_message(Message::Signature(SignaturePayload {
                        signatures: vec![entry],
                    })),
                },
                Err(err) => {
                    warn!(req = %req_id.short(), %err, "producer signature failed");
                    continue;
                }
            }
            if let Err(err) = pool.add_local(tx).await {
                warn!(req = %req_id.short(), %err, "adding contract result to pool failed");
            }
        }
        Ok(())
    }

    /// Whether an incoming contract result matches what this node would
    /// (or did) produce for the request.
    pub async fn check_contract_tx_valid(&self, tx: &Transaction) -> bool {
        if !check_tx_sig_valid(tx) {
            return false;
        }
        if !self.node_contract_executable(tx) {
            return false;
        }
        let req_id = tx.request_hash();

        let local_rst = {
            let inner = self.inner.lock().await;
            match inner.mtx.get(&req_id) {
                Some(record) if !record.valid && record.rst_tx.is_none() => return false,
                Some(record) => record.rst_tx.clone(),
                None => None,
            }
        };
        if let Some(rst) = local_rst {
            return msgs_equal_ignoring_sigs(&rst, tx);
        }

        // No local result yet: execute and compare.
        let request = tx.request_view();
        match self.executor.run(request.clone()).await {
            Ok(msgs) => {
                let mut expected = request;
                for msg in msgs {
                    expected.add_message(msg);
                }
                let mut inner = self.inner.lock().await;
                if let Some(record) = inner.mtx.get_mut(&req_id) {
                    record.valid = false;
                }
                msgs_equal_ignoring_sigs(&expected, tx)
            }
            Err(err) => {
                warn!(req = %req_id.short(), %err, "verification execution failed");
                false
            }
        }
    }

    /// Whether this node may execute the request: a local active mediator
    /// for system contracts, a local active jury member for user contracts.
    pub fn node_contract_executable(&self, tx: &Transaction) -> bool {
        let system = tx.is_system_contract();
        self.keystore.addresses().iter().any(|addr| {
            if system {
                self.state.is_active_mediator(addr)
            } else {
                self.state.is_active_jury(addr)
            }
        })
    }

    /// Locally-known jury assignment for the request's target contract.
    fn local_election_list(&self, tx: &Transaction) -> Vec<ElectionInfo> {
        let Some(contract_id) = contract_target(tx) else {
            return Vec::new();
        };
        self.state
            .contract_jury(&contract_id)
            .into_iter()
            .map(|addr| ElectionInfo {
                addr_hash: keccak256(addr.as_bytes()),
                proof: Vec::new(),
                public_key: Vec::new(),
            })
            .collect()
    }

    /// One GC pass: reap stale invalid records, re-broadcast complete but
    /// uncommitted signature sets. Returns the events to re-broadcast.
    pub async fn sweep(&self, now: Timestamp) -> Vec<ContractEvent> {
        // Snapshot the keys under the lock, then delete under the lock.
        let keys: Vec<Hash> = self.inner.lock().await.mtx.keys().copied().collect();

        let mut rebroadcast = Vec::new();
        let mut inner = self.inner.lock().await;
        for key in keys {
            let Some(record) = inner.mtx.get(&key) else {
                continue;
            };
            if record.created_at.has_expired(STALE_AFTER_SECS, now) && !record.valid {
                info!(req = %key.short(), "deleting stale contract request");
                inner.mtx.remove(&key);
                inner.mel.remove(&key);
                continue;
            }
            if record.rst_tx.is_none() {
                if let Some(sig_tx) = &record.sig_tx {
                    if sig_tx.signature_count() >= self.config.contract_sig_num
                        && record.created_at.has_expired(COMMIT_TIMEOUT_SECS, now)
                    {
                        debug!(req = %key.short(), "re-broadcasting uncommitted result");
                        rebroadcast.push(ContractEvent {
                            ctype: ContractEventType::Commit,
                            tx: sig_tx.clone(),
                            ele: record.ele_inf.clone(),
                        });
                    }
                }
            }
        }
        let stale_elections: Vec<Hash> = inner
            .mel
            .iter()
            .filter(|(_, e)| e.invalid && e.created_at.has_expired(STALE_AFTER_SECS, now))
            .map(|(k, _)| *k)
            .collect();
        for key in stale_elections {
            inner.mel.remove(&key);
        }
        rebroadcast
    }
}

/// Timer-driven GC loop; exits within one tick of shutdown.
pub async fn run_gc(processor: Arc<Processor>, mut shutdown: broadcast::Receiver<()>) {
    let mut tick = tokio::time::interval(GC_INTERVAL);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                debug!("contract processor gc stopped");
                return;
            }
            _ = tick.tick() => {
                for event in processor.sweep(Timestamp::now()).await {
                    processor.contract_feed.send(event).await;
                }
            }
        }
    }
}

/// Signature-level sanity: any signature message must verify against the
/// transaction's signing hash. Full pipeline validation happens at pool
/// admission.
fn check_tx_sig_valid(tx: &Transaction) -> bool {
    if tx.messages.is_empty() {
        return false;
    }
    let result_hash = tx.result_signing_hash();
    if let Some(payload) = tx.signature_payload() {
        for entry in &payload.signatures {
            if !verify_signature(&entry.pub_key, &entry.signature, result_hash.as_bytes()) {
                return false;
            }
        }
    }
    true
}

/// Equality over everything except signature messages.
fn msgs_equal_ignoring_sigs(a: &Transaction, b: &Transaction) -> bool {
    let strip = |tx: &Transaction| -> Vec<Message> {
        tx.messages
            .iter()
            .filter(|m| !matches!(m, Message::Signature(_)))
            .cloned()
            .collect()
    };
    strip(a) == strip(b)
}

/// Fold the first signature of `recv` into `local`.
///
/// `Ok(true)` appended, `Ok(false)` duplicate, `Err` when the transactions
/// disagree outside their signature messages.
fn check_and_add_sig(local: &mut Transaction, recv: &Transaction) -> Result<bool, JuryError> {
    if local.messages.len() != recv.messages.len() {
        return Err(JuryError::TxMismatch);
    }
    for (ma, mb) in local.messages.iter().zip(recv.messages.iter()) {
        match (ma, mb) {
            (Message::Signature(_), Message::Signature(_)) => {}
            (a, b) if a == b => {}
            _ => return Err(JuryError::TxMismatch),
        }
    }
    let incoming = recv
        .signature_payload()
        .and_then(|p| p.signatures.first())
        .cloned()
        .ok_or(JuryError::TxMismatch)?;
    let payload = local.signature_payload_mut().ok_or(JuryError::TxMismatch)?;
    if payload
        .signatures
        .iter()
        .any(|s| s.pub_key == incoming.pub_key && s.signature == incoming.signature)
    {
        return Ok(false);
    }
    payload.signatures.push(incoming);
    Ok(true)
}

/// Leader rule: the local signature (entry 0) must compare strictly below
/// every collected peer signature, byte-wise.
fn local_is_min_signature(tx: &Transaction) -> bool {
    let Some(payload) = tx.signature_payload() else {
        return false;
    };
    let Some(local) = payload.signatures.first() else {
        return false;
    };
    payload
        .signatures
        .iter()
        .skip(1)
        .all(|s| s.signature > local.signature)
}

/// The id the election keys off: the target of the request's contract
/// message. Install requests have no target yet.
fn contract_target(tx: &Transaction) -> Option<Vec<u8>> {
    for msg in &tx.messages {
        match msg {
            Message::ContractInvokeRequest(p) => return Some(p.contract_id.clone()),
            Message::ContractStopRequest(p) => return Some(p.contract_id.clone()),
            Message::ContractDeployRequest(p) => return Some(p.tpl_id.clone()),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ContractExecutor;
    use ptn_crypto::generate_keypair;
    use ptn_store::MemoryState;
    use ptn_types::{
        ContractInvokePayload, ContractInvokeRequestPayload, DataPayload, Input, OutPoint,
        PaymentPayload,
    };

    /// Deterministic sandbox: one invoke-result message.
    struct FixedExecutor;

    impl ContractExecutor for FixedExecutor {
        fn run(&self, request: &Transaction) -> Result<Vec<Message>, JuryError> {
            let contract_id = contract_target(request).unwrap_or_default();
            Ok(vec![Message::ContractInvoke(ContractInvokePayload {
                contract_id,
                args: vec![],
                execution_time_ms: 5,
                read_set: vec![],
                write_set: vec![],
                payload: b"ok".to_vec(),
            })])
        }
    }

    struct FailingExecutor;

    impl ContractExecutor for FailingExecutor {
        fn run(&self, _request: &Transaction) -> Result<Vec<Message>, JuryError> {
            Err(JuryError::ExecFailed("sandbox unavailable".into()))
        }
    }

    /// A user-contract invoke request (contract id with non-zero prefix).
    fn invoke_request() -> Transaction {
        Transaction::new(vec![
            Message::Payment(PaymentPayload::new(
                vec![Input::new(OutPoint::new(Hash::new([5u8; 32]), 0, 0), vec![])],
                vec![],
            )),
            Message::ContractInvokeRequest(ContractInvokeRequestPayload {
                contract_id: vec![7, 7, 7],
                function_name: "set".into(),
                args: vec![b"k".to_vec()],
                timeout_secs: 10,
            }),
        ])
    }

    /// One juror node with its own keystore, registered as an active jury.
    fn juror(state: &Arc<MemoryState>, sig_num: usize) -> Arc<Processor> {
        let keystore = Arc::new(KeyStore::new());
        let addr = keystore.insert(generate_keypair()).unwrap();
        state.add_active_jury(addr);
        Processor::new(
            JuryConfig {
                election_num: 1,
                contract_sig_num: sig_num,
                ..Default::default()
            },
            state.clone() as Arc<dyn ChainState>,
            keystore,
            Arc::new(FixedExecutor),
        )
    }

    async fn next_of_type(
        rx: &mut mpsc::Receiver<ContractEvent>,
        ctype: ContractEventType,
    ) -> ContractEvent {
        loop {
            let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("timed out waiting for contract event")
                .expect("feed closed");
            if event.ctype == ctype {
                return event;
            }
        }
    }

    #[tokio::test]
    async fn single_juror_executes_signs_and_commits() {
        let state = Arc::new(MemoryState::new());
        let p = juror(&state, 1);
        let mut events = p.subscribe_contract_events(16);

        let tx = invoke_request();
        let req_id = p.broadcast_request(tx).await.unwrap();

        // EXEC broadcast, then the locally-signed result, then the commit.
        let exec = next_of_type(&mut events, ContractEventType::Exec).await;
        assert_eq!(exec.tx.request_hash(), req_id);
        let sig = next_of_type(&mut events, ContractEventType::Sig).await;
        assert_eq!(sig.tx.signature_count(), 1);
        let commit = next_of_type(&mut events, ContractEventType::Commit).await;
        assert_eq!(commit.tx.request_hash(), req_id);

        let rst = p.committed_result(&req_id).await.unwrap();
        assert!(rst.messages.iter().any(|m| m.is_contract_result()));
    }

    #[tokio::test]
    async fn duplicate_exec_events_are_ignored() {
        let state = Arc::new(MemoryState::new());
        let p = juror(&state, 1);
        let mut events = p.subscribe_contract_events(16);

        let tx = invoke_request();
        let event = ContractEvent {
            ctype: ContractEventType::Exec,
            tx,
            ele: vec![],
        };
        p.process(event.clone()).await.unwrap();
        let _ = next_of_type(&mut events, ContractEventType::Commit).await;

        // Second EXEC hits the first-arrival latch: no new broadcasts.
        p.process(event).await.unwrap();
        assert_eq!(p.tracked_requests().await, 1);
        let extra = tokio::time::timeout(Duration::from_millis(100), events.recv()).await;
        assert!(extra.is_err(), "latched exec must not re-broadcast");
    }

    #[tokio::test]
    async fn exactly_one_juror_commits() {
        let state = Arc::new(MemoryState::new());
        let jurors: Vec<Arc<Processor>> =
            (0..3).map(|_| juror(&state, 3)).collect();
        let mut feeds: Vec<mpsc::Receiver<ContractEvent>> = jurors
            .iter()
            .map(|j| j.subscribe_contract_events(32))
            .collect();

        let tx = invoke_request();
        for j in &jurors {
            j.process(ContractEvent {
                ctype: ContractEventType::Exec,
                tx: tx.clone(),
                ele: vec![],
            })
            .await
            .unwrap();
        }

        // Collect each juror's own signed result.
        let mut sigs = Vec::new();
        for feed in feeds.iter_mut() {
            let sig = next_of_type(feed, ContractEventType::Sig).await;
            sigs.push(sig);
        }

        // Full mesh: deliver every signature to every other juror.
        for (i, j) in jurors.iter().enumerate() {
            for (k, sig) in sigs.iter().enumerate() {
                if i != k {
                    j.process(sig.clone()).await.unwrap();
                }
            }
        }

        // Exactly one juror holds the smallest signature and commits.
        let mut commits = 0;
        for feed in feeds.iter_mut() {
            loop {
                match tokio::time::timeout(Duration::from_millis(200), feed.recv()).await {
                    Ok(Some(event)) if event.ctype == ContractEventType::Commit => {
                        commits += 1;
                        assert_eq!(event.tx.signature_count(), 3);
                    }
                    Ok(Some(_)) => continue,
                    _ => break,
                }
            }
        }
        assert_eq!(commits, 1, "exactly one COMMIT must be observed");
    }

    #[tokio::test]
    async fn sig_for_unknown_request_creates_record() {
        let state = Arc::new(MemoryState::new());
        let observer = juror(&state, 3);
        let producer = juror(&state, 1);
        let mut producer_events = producer.subscribe_contract_events(16);

        let tx = invoke_request();
        producer
            .process(ContractEvent {
                ctype: ContractEventType::Exec,
                tx: tx.clone(),
                ele: vec![],
            })
            .await
            .unwrap();
        let sig = next_of_type(&mut producer_events, ContractEventType::Sig).await;

        // The observer never saw the request; the SIG event creates it.
        observer.process(sig).await.unwrap();
        assert_eq!(observer.tracked_requests().await, 1);
    }

    #[tokio::test]
    async fn commit_is_idempotent() {
        let state = Arc::new(MemoryState::new());
        let p = juror(&state, 1);
        let mut events = p.subscribe_contract_events(16);

        let mut committed = invoke_request();
        committed.add_message(Message::ContractInvoke(ContractInvokePayload {
            contract_id: vec![7, 7, 7],
            args: vec![],
            execution_time_ms: 1,
            read_set: vec![],
            write_set: vec![],
            payload: vec![],
        }));
        let event = ContractEvent {
            ctype: ContractEventType::Commit,
            tx: committed.clone(),
            ele: vec![],
        };

        p.process(event.clone()).await.unwrap();
        let first = next_of_type(&mut events, ContractEventType::Commit).await;
        assert_eq!(first.tx.hash(), committed.hash());

        // Second commit is swallowed.
        p.process(event).await.unwrap();
        let extra = tokio::time::timeout(Duration::from_millis(100), events.recv()).await;
        assert!(extra.is_err());
    }

    #[tokio::test]
    async fn failed_execution_marks_record_for_gc() {
        let state = Arc::new(MemoryState::new());
        let keystore = Arc::new(KeyStore::new());
        let addr = keystore.insert(generate_keypair()).unwrap();
        state.add_active_jury(addr);
        let p = Processor::new(
            JuryConfig {
                election_num: 1,
                contract_sig_num: 1,
                ..Default::default()
            },
            state.clone() as Arc<dyn ChainState>,
            keystore,
            Arc::new(FailingExecutor),
        );

        p.process(ContractEvent {
            ctype: ContractEventType::Exec,
            tx: invoke_request(),
            ele: vec![],
        })
        .await
        .unwrap();

        // Wait for the spawned execution to fail.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(p.tracked_requests().await, 1);

        // Young records survive the sweep; expired invalid ones do not.
        p.sweep(Timestamp::now()).await;
        assert_eq!(p.tracked_requests().await, 1);
        let future = Timestamp::new(Timestamp::now().as_secs() + STALE_AFTER_SECS + 1);
        p.sweep(future).await;
        assert_eq!(p.tracked_requests().await, 0);
    }

    #[tokio::test]
    async fn committed_records_survive_gc_for_rebroadcast() {
        let state = Arc::new(MemoryState::new());
        let p = juror(&state, 1);
        let mut events = p.subscribe_contract_events(16);

        let req_id = p.broadcast_request(invoke_request()).await.unwrap();
        let _ = next_of_type(&mut events, ContractEventType::Commit).await;

        let future = Timestamp::new(Timestamp::now().as_secs() + STALE_AFTER_SECS + 1);
        p.sweep(future).await;
        assert!(p.committed_result(&req_id).await.is_some());
    }

    #[tokio::test]
    async fn stale_signed_but_uncommitted_result_is_rebroadcast() {
        let state = Arc::new(MemoryState::new());
        let p = juror(&state, 1);
        let mut events = p.subscribe_contract_events(16);

        let req_id = p.broadcast_request(invoke_request()).await.unwrap();
        let _ = next_of_type(&mut events, ContractEventType::Commit).await;

        // Forget the commit but keep the signed result.
        {
            let mut inner = p.inner.lock().await;
            let record = inner.mtx.get_mut(&req_id).unwrap();
            record.rst_tx = None;
        }
        let future = Timestamp::new(Timestamp::now().as_secs() + COMMIT_TIMEOUT_SECS + 1);
        let rebroadcast = p.sweep(future).await;
        assert_eq!(rebroadcast.len(), 1);
        assert_eq!(rebroadcast[0].ctype, ContractEventType::Commit);
    }

    #[tokio::test]
    async fn election_vrf_round_trip() {
        let state = Arc::new(MemoryState::new());
        let asker = juror(&state, 3);
        let answerer = juror(&state, 3);
        let mut answers = answerer.subscribe_election_events(16);

        let tx = invoke_request();
        let req_id = tx.request_hash();

        // No locally-known jury for the contract → VRF request goes out.
        let mut requests = asker.subscribe_election_events(16);
        asker
            .process(ContractEvent {
                ctype: ContractEventType::Ele,
                tx,
                ele: vec![],
            })
            .await
            .unwrap();
        let outbound = requests.recv().await.unwrap();
        assert!(matches!(outbound, ElectionEvent::VrfRequest(_)));

        // The answering node produces a proof for its jury account.
        answerer.process_election_event(outbound).await.unwrap();
        let answer = answers.recv().await.unwrap();
        let ElectionEvent::VrfResult(result) = answer.clone() else {
            panic!("expected a VRF result");
        };
        assert_eq!(result.req_id, req_id);

        // The asker accepts the candidate exactly once.
        asker.process_election_event(answer.clone()).await.unwrap();
        asker.process_election_event(answer).await.unwrap();
        let inner = asker.inner.lock().await;
        assert_eq!(inner.mel.get(&req_id).unwrap().rcv_ele.len(), 1);
        assert_eq!(inner.mtx.get(&req_id).unwrap().ele_inf.len(), 1);
    }

    #[tokio::test]
    async fn tampered_election_proof_is_rejected() {
        let state = Arc::new(MemoryState::new());
        let p = juror(&state, 3);
        let keystore = KeyStore::new();
        let addr = keystore.insert(generate_keypair()).unwrap();
        let req_id = Hash::new([3u8; 32]);
        let entry = keystore.sign(&addr, &req_id).unwrap();

        let mut proof = entry.signature.clone();
        proof[12] ^= 0x01;
        let err = p
            .process_election_event(ElectionEvent::VrfResult(ElectionResultEvent {
                req_id,
                ele: ElectionInfo {
                    addr_hash: keccak256(addr.as_bytes()),
                    proof,
                    public_key: entry.pub_key,
                },
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, JuryError::InvalidElectionProof));
    }

    #[tokio::test]
    async fn sig_event_without_local_accounts_errors() {
        let state = Arc::new(MemoryState::new());
        let p = Processor::new(
            JuryConfig::default(),
            state as Arc<dyn ChainState>,
            Arc::new(KeyStore::new()),
            Arc::new(FixedExecutor),
        );
        let err = p
            .process(ContractEvent {
                ctype: ContractEventType::Sig,
                tx: invoke_request(),
                ele: vec![],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, JuryError::NoLocalAccounts));
    }

    #[tokio::test]
    async fn adapter_signatures_deduplicate() {
        let state = Arc::new(MemoryState::new());
        let p = juror(&state, 1);
        let req_id = p.broadcast_request(invoke_request()).await.unwrap();

        let entry = SignatureEntry {
            pub_key: vec![2; 33],
            signature: vec![9; 65],
        };
        assert!(p.process_adapter_sig(&req_id, 0, entry.clone()).await);
        assert!(!p.process_adapter_sig(&req_id, 0, entry.clone()).await);
        assert!(p.process_adapter_sig(&req_id, 1, entry).await);
    }

    #[test]
    fn min_signature_rule_is_strict() {
        let make = |sigs: Vec<Vec<u8>>| {
            Transaction::new(vec![
                Message::Data(DataPayload {
                    main_data: vec![1],
                    extra_data: vec![],
                }),
                Message::Signature(SignaturePayload {
                    signatures: sigs
                        .into_iter()
                        .map(|s| SignatureEntry {
                            pub_key: vec![2; 33],
                            signature: s,
                        })
                        .collect(),
                }),
            ])
        };

        // Local strictly smallest → leader.
        assert!(local_is_min_signature(&make(vec![
            vec![1; 65],
            vec![2; 65],
            vec![3; 65]
        ])));
        // A peer below local → not leader.
        assert!(!local_is_min_signature(&make(vec![
            vec![2; 65],
            vec![1; 65],
            vec![3; 65]
        ])));
        // Equality is not strictly smaller.
        assert!(!local_is_min_signature(&make(vec![
            vec![1; 65],
            vec![1; 65],
        ])));
    }

    #[test]
    fn check_and_add_sig_appends_and_dedupes() {
        let base = invoke_request();
        let entry = |b: u8| SignatureEntry {
            pub_key: vec![b; 33],
            signature: vec![b; 65],
        };

        let mut local = base.clone();
        local.add_message(Message::Signature(SignaturePayload {
            signatures: vec![entry(1)],
        }));
        let mut recv = base.clone();
        recv.add_message(Message::Signature(SignaturePayload {
            signatures: vec![entry(2)],
        }));

        assert!(check_and_add_sig(&mut local, &recv).unwrap());
        assert_eq!(local.signature_count(), 2);
        // Same signature again: silently dropped.
        assert!(!check_and_add_sig(&mut local, &recv).unwrap());

        // A result over different messages is a mismatch.
        let mut other = Transaction::new(vec![Message::Data(DataPayload {
            main_data: vec![9],
            extra_data: vec![],
        })]);
        other.add_message(Message::Signature(SignaturePayload {
            signatures: vec![entry(3)],
        }));
        assert!(check_and_add_sig(&mut local, &other).is_err());
    }
}

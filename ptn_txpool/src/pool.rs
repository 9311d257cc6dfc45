//! The transaction pool: admission, indexing, eviction and reorg handling.
//!
//! All writers take the single pool lock exclusively; readers share it. The
//! priority ordering is recomputed on demand by [`TxPool::get_sorted_txs`]
//! so producers never observe a half-updated heap.

use crate::{PooledTx, TxJournal, TxPoolConfig, TxPoolError};
use ptn_crypto::pubkey_to_address;
use ptn_store::{ChainQuery, UtxoQuery};
use ptn_types::{
    Address, ChainHeadEvent, Hash, Message, OutPoint, Timestamp, Transaction, TxPreEvent, Unit,
};
use ptn_utils::Feed;
use ptn_validator::Validate;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

/// Reorgs deeper than this are skipped; stragglers can be re-broadcast.
const MAX_REORG_DEPTH: u64 = 64;

/// Decides whether this node can execute a pooled contract request now
/// (mediator for system contracts, jury member for user contracts).
pub type ExecutablePredicate = dyn Fn(&Transaction) -> bool + Send + Sync;

/// Lifecycle position of a pooled transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxStatus {
    Unknown,
    Queued,
    Pending,
}

#[derive(Default)]
struct PoolInner {
    /// Request hash → pooled transaction.
    all: HashMap<Hash, PooledTx>,
    /// Executable subset of `all`.
    pending: HashSet<Hash>,
    /// Not-yet-promotable subset of `all`.
    queue: HashSet<Hash>,
    /// Spent outpoint → spending request hash. Serves double-spend rejection
    /// and reorg reinjection.
    outpoints: HashMap<OutPoint, Hash>,
    /// Full transaction hash → request hash.
    by_tx_hash: HashMap<Hash, Hash>,
    /// Senders exempt from pricing constraints and eviction.
    locals: HashSet<Address>,
    /// Sender → last activity.
    beats: HashMap<Address, Timestamp>,
    sequence: u64,
}

/// The UTXO mempool.
pub struct TxPool {
    config: TxPoolConfig,
    validator: Validate,
    utxo: Arc<dyn UtxoQuery>,
    chain: Arc<dyn ChainQuery>,
    executable: Box<ExecutablePredicate>,
    journal: Option<TxJournal>,
    tx_feed: Feed<TxPreEvent>,
    inner: RwLock<PoolInner>,
}

impl TxPool {
    /// Build a pool and replay its journal, if one is configured.
    pub fn new(
        config: TxPoolConfig,
        validator: Validate,
        utxo: Arc<dyn UtxoQuery>,
        chain: Arc<dyn ChainQuery>,
        executable: Box<ExecutablePredicate>,
    ) -> Self {
        let config = config.sanitize();
        let journal = match (&config.journal, config.no_locals) {
            (Some(path), false) => Some(TxJournal::new(path.clone())),
            _ => None,
        };

        let pool = Self {
            config,
            validator,
            utxo,
            chain,
            executable,
            journal,
            tx_feed: Feed::new(),
            inner: RwLock::new(PoolInner::default()),
        };

        if let Some(journal) = &pool.journal {
            if let Err(err) = journal.load(|tx| pool.add_sync(tx, true).map(|_| ())) {
                warn!(%err, "failed to load transaction journal");
            }
            pool.rotate_journal();
        }
        pool
    }

    /// Subscribe to admissions.
    pub fn subscribe_tx_events(&self, capacity: usize) -> mpsc::Receiver<TxPreEvent> {
        self.tx_feed.subscribe(capacity)
    }

    /// Enqueue a single local transaction, exempting its sender from
    /// pricing constraints unless local handling is disabled.
    pub async fn add_local(&self, tx: Transaction) -> Result<(), TxPoolError> {
        let event = self.add_sync(tx, !self.config.no_locals)?;
        self.promote_executables();
        self.tx_feed.send(event).await;
        Ok(())
    }

    /// Enqueue a single remote transaction under full pricing constraints.
    pub async fn add_remote(&self, tx: Transaction) -> Result<(), TxPoolError> {
        let event = self.add_sync(tx, false)?;
        self.promote_executables();
        self.tx_feed.send(event).await;
        Ok(())
    }

    /// Batch variants; per-transaction outcomes are returned in order.
    pub async fn add_remotes(&self, txs: Vec<Transaction>) -> Vec<Result<(), TxPoolError>> {
        let mut results = Vec::with_capacity(txs.len());
        for tx in txs {
            results.push(self.add_remote(tx).await);
        }
        results
    }

    /// Synchronous admission; returns the event for the caller to publish.
    fn add_sync(&self, tx: Transaction, local: bool) -> Result<TxPreEvent, TxPoolError> {
        let now = Timestamp::now();
        let hash = tx.hash();
        let request_hash = tx.request_hash();
        let from = sender_of(&tx);

        let mut inner = self.inner.write().expect("pool lock poisoned");
        let local = local || inner.locals.contains(&from);

        // 1. Exact duplicate.
        if let Some(existing) = inner.all.get(&request_hash) {
            if existing.hash == hash {
                debug!(%hash, "discarding already known transaction");
                return Err(TxPoolError::Known(hash.to_string()));
            }
        }

        // 2. Double spend against the pool.
        for outpoint in tx.input_outpoints() {
            if let Some(spender) = inner.outpoints.get(&outpoint) {
                if *spender != request_hash {
                    return Err(TxPoolError::DoubleSpend {
                        outpoint: outpoint.to_string(),
                        spender: spender.to_string(),
                    });
                }
            }
        }

        // 3. Full validation.
        let code = self.validator.validate_tx(&tx, false);
        if !code.is_valid() {
            debug!(%hash, %code, "discarding invalid transaction");
            return Err(TxPoolError::Invalid(code));
        }

        let fee = tx.fee(|op| self.utxo.utxo(op)).unwrap_or(0);
        // Remote senders must clear the pool's own fee floor.
        if !local && fee < self.config.fee_limit {
            return Err(TxPoolError::FeeTooLow);
        }
        let size = tx.size();
        let incoming_priority = if size == 0 { 0.0 } else { fee as f64 / size as f64 };

        // 4. Capacity: evict the cheapest non-local entries, or refuse.
        let replacing = inner.all.contains_key(&request_hash);
        if !replacing && inner.all.len() as u64 >= self.config.capacity() {
            if !local && self.underpriced(&inner, incoming_priority, now) {
                debug!(%hash, "discarding underpriced transaction");
                return Err(TxPoolError::Underpriced);
            }
            let needed = inner.all.len() as u64 - (self.config.capacity() - 1);
            if !self.discard_cheapest(&mut inner, needed, now) {
                return Err(TxPoolError::Underpriced);
            }
        }

        // 5. Replacement of a pooled request requires a price bump.
        if let Some(old) = inner.all.get(&request_hash) {
            let old_priority = old.priority(now);
            let required = if old.pending {
                old_priority * (1.0 + self.config.price_bump as f64 / 100.0)
            } else {
                old_priority
            };
            if incoming_priority <= required {
                return Err(TxPoolError::ReplaceUnderpriced);
            }
            remove_entry(&mut inner, &request_hash);
        }

        // 6. Index.
        inner.sequence += 1;
        let executable = (self.executable)(&tx) || !tx.is_request();
        let pooled = PooledTx {
            hash,
            request_hash,
            from,
            fee,
            size,
            creation: now,
            sequence: inner.sequence,
            pending: executable,
            tx,
        };
        for outpoint in pooled.tx.input_outpoints() {
            inner.outpoints.insert(outpoint, request_hash);
        }
        inner.by_tx_hash.insert(hash, request_hash);
        if executable {
            inner.pending.insert(request_hash);
            inner.beats.insert(from, now);
        } else {
            inner.queue.insert(request_hash);
        }
        let event = TxPreEvent {
            tx: pooled.tx.clone(),
        };
        inner.all.insert(request_hash, pooled);

        // 7. Journal local senders.
        if local {
            inner.locals.insert(from);
            if let Some(journal) = &self.journal {
                if let Err(err) = journal.insert(&event.tx) {
                    warn!(%err, "failed to journal local transaction");
                }
            }
        }

        debug!(%hash, %from, "pooled new transaction");
        Ok(event)
    }

    /// Whether `priority` is below every non-local pooled transaction.
    fn underpriced(&self, inner: &PoolInner, priority: f64, now: Timestamp) -> bool {
        inner
            .all
            .values()
            .filter(|p| !inner.locals.contains(&p.from))
            .map(|p| p.priority(now))
            .fold(None::<f64>, |min, p| {
                Some(min.map_or(p, |m| m.min(p)))
            })
            .is_some_and(|floor| priority < floor)
    }

    /// Evict `count` cheapest non-local entries. Returns false when not
    /// enough could be discarded.
    fn discard_cheapest(&self, inner: &mut PoolInner, count: u64, now: Timestamp) -> bool {
        for _ in 0..count {
            let victim = inner
                .all
                .values()
                .filter(|p| !inner.locals.contains(&p.from))
                .min_by(|a, b| {
                    a.priority(now)
                        .partial_cmp(&b.priority(now))
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|p| p.request_hash);
            match victim {
                Some(req) => {
                    debug!(%req, "discarding freshly underpriced transaction");
                    remove_entry(inner, &req);
                }
                None => return false,
            }
        }
        true
    }

    /// All pooled transactions sorted by priority (descending), arrival
    /// order breaking ties, computed under one snapshot of the lock.
    pub fn get_sorted_txs(&self) -> Vec<PooledTx> {
        let now = Timestamp::now();
        let inner = self.inner.read().expect("pool lock poisoned");
        let mut txs: Vec<PooledTx> = inner.all.values().cloned().collect();
        txs.sort_by(|a, b| {
            b.priority(now)
                .partial_cmp(&a.priority(now))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.sequence.cmp(&b.sequence))
        });
        txs
    }

    /// Pending/queued counts.
    pub fn stats(&self) -> (usize, usize) {
        let inner = self.inner.read().expect("pool lock poisoned");
        (inner.pending.len(), inner.queue.len())
    }

    pub fn count(&self) -> usize {
        self.inner.read().expect("pool lock poisoned").all.len()
    }

    /// Lifecycle status for a batch of request hashes.
    pub fn status(&self, hashes: &[Hash]) -> Vec<TxStatus> {
        let inner = self.inner.read().expect("pool lock poisoned");
        hashes
            .iter()
            .map(|h| {
                if inner.pending.contains(h) {
                    TxStatus::Pending
                } else if inner.queue.contains(h) {
                    TxStatus::Queued
                } else {
                    TxStatus::Unknown
                }
            })
            .collect()
    }

    /// Fetch one pooled transaction by request hash.
    pub fn get(&self, request_hash: &Hash) -> Option<PooledTx> {
        self.inner
            .read()
            .expect("pool lock poisoned")
            .all
            .get(request_hash)
            .cloned()
    }

    pub fn contains(&self, request_hash: &Hash) -> bool {
        self.inner
            .read()
            .expect("pool lock poisoned")
            .all
            .contains_key(request_hash)
    }

    /// Currently pooled transactions from local senders.
    pub fn local(&self) -> Vec<Transaction> {
        let inner = self.inner.read().expect("pool lock poisoned");
        inner
            .all
            .values()
            .filter(|p| inner.locals.contains(&p.from))
            .map(|p| p.tx.clone())
            .collect()
    }

    /// Record sender liveness; exempts their transactions from eviction for
    /// another lifetime.
    pub fn heartbeat(&self, from: Address) {
        self.inner
            .write()
            .expect("pool lock poisoned")
            .beats
            .insert(from, Timestamp::now());
    }

    /// Remove a committed transaction and everything it double-spends.
    pub fn remove_committed(&self, tx: &Transaction) {
        let request_hash = tx.request_hash();
        let mut inner = self.inner.write().expect("pool lock poisoned");
        // Conflicting spenders (and their dependents) are now invalid.
        for outpoint in tx.input_outpoints() {
            if let Some(spender) = inner.outpoints.get(&outpoint).copied() {
                if spender != request_hash {
                    remove_with_redeemers(&mut inner, &spender);
                }
            }
        }
        remove_entry(&mut inner, &request_hash);
    }

    /// Remove one transaction; `remove_redeemers` cascades to pooled
    /// transactions spending its outputs.
    pub fn remove_transaction(&self, tx: &Transaction, remove_redeemers: bool) {
        let request_hash = tx.request_hash();
        let mut inner = self.inner.write().expect("pool lock poisoned");
        if remove_redeemers {
            remove_with_redeemers(&mut inner, &request_hash);
        } else {
            remove_entry(&mut inner, &request_hash);
        }
    }

    /// Drop transactions whose sender has shown no heartbeat for a full
    /// lifetime. Local senders are exempt.
    pub fn evict_stale(&self, now: Timestamp) {
        let lifetime = self.config.lifetime_secs;
        let mut inner = self.inner.write().expect("pool lock poisoned");
        let stale: Vec<Hash> = inner
            .all
            .values()
            .filter(|p| !inner.locals.contains(&p.from))
            .filter(|p| match inner.beats.get(&p.from) {
                Some(beat) => beat.has_expired(lifetime, now),
                None => p.creation.has_expired(lifetime, now),
            })
            .map(|p| p.request_hash)
            .collect();
        for req in stale {
            debug!(%req, "evicting transaction without heartbeat");
            remove_entry(&mut inner, &req);
        }
    }

    /// Rewrite the journal with the surviving local transactions.
    pub fn rotate_journal(&self) {
        let Some(journal) = &self.journal else { return };
        let local = self.local();
        if let Err(err) = journal.rotate(&local) {
            warn!(%err, "failed to rotate local tx journal");
        }
    }

    /// Reorg entry point: realign the pool from `old_head` to `new_head`.
    ///
    /// Transactions on the abandoned branch that the new branch does not
    /// include are reinjected as remote transactions; committed ones leave
    /// the pool; then the executable sets are rebuilt.
    pub async fn reset(&self, old_head: Option<&Unit>, new_head: &Unit) {
        let mut discarded: Vec<Transaction> = Vec::new();
        let mut included: Vec<Transaction> = new_head.transactions.clone();

        if let Some(old) = old_head {
            if old.hash() != new_head.hash() && old.hash() != new_head.parent_hash() {
                let depth = old.number().abs_diff(new_head.number());
                if depth > MAX_REORG_DEPTH {
                    debug!(depth, "skipping deep transaction reorg");
                } else if let Some((d, i)) = self.walk_branches(old, new_head) {
                    discarded = d;
                    included = i;
                }
            }
        }

        let included_hashes: HashSet<Hash> =
            included.iter().map(|tx| tx.request_hash()).collect();

        // Committed transactions leave the pool.
        for tx in &included {
            self.remove_committed(tx);
        }

        // Reinject the dropped remainder, bypassing locality.
        let reinject: Vec<Transaction> = discarded
            .into_iter()
            .filter(|tx| !included_hashes.contains(&tx.request_hash()))
            .collect();
        if !reinject.is_empty() {
            debug!(count = reinject.len(), "reinjecting stale transactions");
        }
        let mut events = Vec::new();
        for tx in reinject {
            match self.add_sync(tx, false) {
                Ok(event) => events.push(event),
                Err(err) => debug!(%err, "reorged transaction not reinjected"),
            }
        }

        self.demote_unexecutables();
        self.promote_executables();

        for event in events {
            self.tx_feed.send(event).await;
        }
    }

    /// Walk both branches back to the common ancestor, collecting dropped
    /// and newly-included transactions. `None` means an unrooted branch.
    fn walk_branches(
        &self,
        old_head: &Unit,
        new_head: &Unit,
    ) -> Option<(Vec<Transaction>, Vec<Transaction>)> {
        let mut discarded = Vec::new();
        let mut included = Vec::new();
        let mut rem = old_head.clone();
        let mut add = new_head.clone();
        let mut steps = 0u64;

        loop {
            if steps > 2 * MAX_REORG_DEPTH {
                debug!("abandoning reorg walk past depth bound");
                return None;
            }
            steps += 1;

            if rem.number() > add.number() {
                discarded.extend(rem.transactions.clone());
                rem = match self.chain.unit_by_hash(&rem.parent_hash()) {
                    Some(unit) => unit,
                    None => {
                        error!(hash = %old_head.hash(), "unrooted old unit seen by tx pool");
                        return None;
                    }
                };
            } else if add.number() > rem.number() {
                included.extend(add.transactions.clone());
                add = match self.chain.unit_by_hash(&add.parent_hash()) {
                    Some(unit) => unit,
                    None => {
                        error!(hash = %new_head.hash(), "unrooted new unit seen by tx pool");
                        return None;
                    }
                };
            } else if rem.hash() != add.hash() {
                discarded.extend(rem.transactions.clone());
                included.extend(add.transactions.clone());
                rem = self.chain.unit_by_hash(&rem.parent_hash())?;
                add = self.chain.unit_by_hash(&add.parent_hash())?;
            } else {
                break;
            }
        }
        Some((discarded, included))
    }

    /// Purge pending entries whose inputs no longer resolve against the
    /// UTXO view or the pool itself.
    fn demote_unexecutables(&self) {
        let mut inner = self.inner.write().expect("pool lock poisoned");
        let doomed: Vec<Hash> = inner
            .pending
            .iter()
            .filter(|req| {
                let Some(pooled) = inner.all.get(*req) else {
                    return true;
                };
                pooled.tx.input_outpoints().iter().any(|op| {
                    self.utxo.utxo(op).is_none() && !inner.by_tx_hash.contains_key(&op.tx_hash)
                })
            })
            .copied()
            .collect();
        for req in doomed {
            debug!(%req, "demoting unexecutable transaction");
            remove_entry(&mut inner, &req);
        }
    }

    /// Promote queued entries that became executable, then trim the largest
    /// senders while the pending set overflows its slots.
    fn promote_executables(&self) {
        let now = Timestamp::now();
        let mut inner = self.inner.write().expect("pool lock poisoned");

        let promotable: Vec<Hash> = inner
            .queue
            .iter()
            .filter(|req| {
                inner
                    .all
                    .get(*req)
                    .is_some_and(|p| (self.executable)(&p.tx) || !p.tx.is_request())
            })
            .copied()
            .collect();
        for req in promotable {
            inner.queue.remove(&req);
            inner.pending.insert(req);
            let from = inner.all.get_mut(&req).map(|pooled| {
                pooled.pending = true;
                pooled.from
            });
            if let Some(from) = from {
                inner.beats.insert(from, now);
            }
        }

        // Per-account ceiling: a sender keeps at most `account_slots`
        // executable entries; the overflow waits in the queue.
        let account_excess: Vec<Hash> = {
            let mut by_sender: HashMap<Address, Vec<Hash>> = HashMap::new();
            for req in &inner.pending {
                if let Some(p) = inner.all.get(req) {
                    if !inner.locals.contains(&p.from) {
                        by_sender.entry(p.from).or_default().push(*req);
                    }
                }
            }
            let mut excess = Vec::new();
            for (_, mut reqs) in by_sender {
                if reqs.len() as u64 <= self.config.account_slots {
                    continue;
                }
                sort_by_priority(&inner, &mut reqs, now);
                let keep = reqs.len() - self.config.account_slots as usize;
                excess.extend(reqs.into_iter().take(keep));
            }
            excess
        };
        for req in account_excess {
            debug!(%req, "demoting account-slot-exceeding transaction");
            demote_to_queue(&mut inner, &req);
        }

        // Fairness pass: shrink the biggest senders first while the pending
        // set overflows its global slots.
        while inner.pending.len() as u64 > self.config.global_slots {
            let mut by_sender: HashMap<Address, Vec<Hash>> = HashMap::new();
            for req in &inner.pending {
                if let Some(p) = inner.all.get(req) {
                    if !inner.locals.contains(&p.from) {
                        by_sender.entry(p.from).or_default().push(*req);
                    }
                }
            }
            let Some((_, mut reqs)) = by_sender
                .into_iter()
                .max_by_key(|(_, reqs)| reqs.len())
            else {
                break;
            };
            sort_by_priority(&inner, &mut reqs, now);
            match reqs.first() {
                Some(req) => {
                    debug!(%req, "demoting fairness-exceeding pending transaction");
                    demote_to_queue(&mut inner, &req.clone());
                }
                None => break,
            }
        }

        // Queue-side ceiling: senders above `account_queue` lose the excess.
        let queue_excess: Vec<Hash> = {
            let mut by_sender: HashMap<Address, Vec<Hash>> = HashMap::new();
            for req in &inner.queue {
                if let Some(p) = inner.all.get(req) {
                    if !inner.locals.contains(&p.from) {
                        by_sender.entry(p.from).or_default().push(*req);
                    }
                }
            }
            let mut excess = Vec::new();
            for (_, mut reqs) in by_sender {
                if reqs.len() as u64 <= self.config.account_queue {
                    continue;
                }
                sort_by_priority(&inner, &mut reqs, now);
                let keep = reqs.len() - self.config.account_queue as usize;
                excess.extend(reqs.into_iter().take(keep));
            }
            excess
        };
        for req in queue_excess {
            debug!(%req, "dropping account-queue-exceeding transaction");
            remove_entry(&mut inner, &req);
        }
    }
}

/// Ascending priority order, in place.
fn sort_by_priority(inner: &PoolInner, reqs: &mut [Hash], now: Timestamp) {
    reqs.sort_by(|a, b| {
        let pa = inner.all.get(a).map_or(0.0, |p| p.priority(now));
        let pb = inner.all.get(b).map_or(0.0, |p| p.priority(now));
        pa.partial_cmp(&pb).unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Move an executable entry back to the queue.
fn demote_to_queue(inner: &mut PoolInner, request_hash: &Hash) {
    if inner.pending.remove(request_hash) {
        inner.queue.insert(*request_hash);
        if let Some(pooled) = inner.all.get_mut(request_hash) {
            pooled.pending = false;
        }
    }
}

/// Drop one entry from every index.
fn remove_entry(inner: &mut PoolInner, request_hash: &Hash) {
    let Some(pooled) = inner.all.remove(request_hash) else {
        return;
    };
    inner.pending.remove(request_hash);
    inner.queue.remove(request_hash);
    inner.by_tx_hash.remove(&pooled.hash);
    for outpoint in pooled.tx.input_outpoints() {
        if inner.outpoints.get(&outpoint) == Some(request_hash) {
            inner.outpoints.remove(&outpoint);
        }
    }
    if pooled.pending {
        inner.beats.remove(&pooled.from);
    }
}

/// Remove an entry plus every pooled transaction spending its outputs.
fn remove_with_redeemers(inner: &mut PoolInner, request_hash: &Hash) {
    let Some(pooled) = inner.all.get(request_hash) else {
        return;
    };
    let tx_hash = pooled.hash;
    let mut dependents = Vec::new();
    for (msg_idx, msg) in pooled.tx.messages.iter().enumerate() {
        if let Message::Payment(p) = msg {
            for out_idx in 0..p.outputs.len() {
                let op = OutPoint::new(tx_hash, msg_idx as u32, out_idx as u32);
                if let Some(spender) = inner.outpoints.get(&op) {
                    dependents.push(*spender);
                }
            }
        }
    }
    for dependent in dependents {
        remove_with_redeemers(inner, &dependent);
    }
    remove_entry(inner, request_hash);
}

/// Sender derivation: the address behind the first real input's unlock
/// script. Transactions without one (pure data anchors) map to the zero
/// address.
fn sender_of(tx: &Transaction) -> Address {
    for msg in &tx.messages {
        if let Message::Payment(p) = msg {
            for input in &p.inputs {
                if input.signature_script.len() > 65 {
                    let pubkey = &input.signature_script[..input.signature_script.len() - 65];
                    if let Ok(addr) = pubkey_to_address(pubkey) {
                        return addr;
                    }
                }
            }
        }
    }
    Address::ZERO
}

/// The pool's event loop: reacts to chain head changes and runs the
/// eviction, stats and rejournal tickers until shutdown.
///
/// On shutdown the head channel is drained without processing.
pub async fn run_loop(
    pool: Arc<TxPool>,
    mut head_rx: mpsc::Receiver<ChainHeadEvent>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut evict = tokio::time::interval(std::time::Duration::from_secs(60));
    let mut stats = tokio::time::interval(std::time::Duration::from_secs(8));
    let mut rejournal = tokio::time::interval(pool.config.rejournal());
    evict.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    stats.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    rejournal.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut head = pool.chain.head_unit();
    let (mut prev_pending, mut prev_queued) = (0usize, 0usize);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                while head_rx.try_recv().is_ok() {}
                info!("transaction pool stopped");
                return;
            }
            event = head_rx.recv() => {
                match event {
                    Some(ev) => {
                        pool.reset(head.as_ref(), &ev.unit).await;
                        head = Some(ev.unit);
                    }
                    None => {
                        info!("chain head feed closed, transaction pool stopped");
                        return;
                    }
                }
            }
            _ = evict.tick() => {
                pool.evict_stale(Timestamp::now());
            }
            _ = stats.tick() => {
                let (pending, queued) = pool.stats();
                if pending != prev_pending || queued != prev_queued {
                    debug!(executable = pending, queued, "transaction pool status report");
                    (prev_pending, prev_queued) = (pending, queued);
                }
            }
            _ = rejournal.tick() => {
                pool.rotate_journal();
            }
        }
    }
}

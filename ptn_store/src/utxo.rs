//! UTXO lookups and pool-side viewpoints.

use parking_lot::RwLock;
use ptn_types::{Message, OutPoint, Transaction, Utxo};
use std::collections::HashMap;

/// Read-only access to the unspent output set.
pub trait UtxoQuery: Send + Sync {
    fn utxo(&self, outpoint: &OutPoint) -> Option<Utxo>;
}

/// An indexed snapshot of unspent outputs.
///
/// The validator and mempool read through this view; all mutation happens
/// through unit acceptance.
#[derive(Default)]
pub struct UtxoView {
    entries: RwLock<HashMap<OutPoint, Utxo>>,
}

impl UtxoView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, outpoint: OutPoint, utxo: Utxo) {
        self.entries.write().insert(outpoint, utxo);
    }

    pub fn remove(&self, outpoint: &OutPoint) -> Option<Utxo> {
        self.entries.write().remove(outpoint)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Index every payment output of `tx` as unspent.
    pub fn add_tx_outputs(&self, tx: &Transaction) {
        let hash = tx.hash();
        let mut entries = self.entries.write();
        for (msg_idx, msg) in tx.messages.iter().enumerate() {
            if let Message::Payment(p) = msg {
                for (out_idx, output) in p.outputs.iter().enumerate() {
                    let outpoint = OutPoint::new(hash, msg_idx as u32, out_idx as u32);
                    entries.insert(
                        outpoint,
                        Utxo::new(output.value, output.pk_script.clone(), output.asset, outpoint),
                    );
                }
            }
        }
    }

    /// Remove every output spent by `tx`'s payment inputs.
    pub fn spend_tx_inputs(&self, tx: &Transaction) {
        let mut entries = self.entries.write();
        for outpoint in tx.input_outpoints() {
            entries.remove(&outpoint);
        }
    }
}

impl UtxoQuery for UtxoView {
    fn utxo(&self, outpoint: &OutPoint) -> Option<Utxo> {
        self.entries.read().get(outpoint).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ptn_types::{Address, Asset, Hash, Input, Output, PaymentPayload};

    fn payment_tx(value: u64) -> Transaction {
        let msg = Message::Payment(PaymentPayload::new(
            vec![Input::new(OutPoint::new(Hash::new([1u8; 32]), 0, 0), vec![])],
            vec![Output::new(value, &Address::new([2u8; 20]), Asset::ptn())],
        ));
        Transaction::new(vec![msg])
    }

    #[test]
    fn add_then_lookup_outputs() {
        let view = UtxoView::new();
        let tx = payment_tx(77);
        view.add_tx_outputs(&tx);

        let outpoint = OutPoint::new(tx.hash(), 0, 0);
        let utxo = view.utxo(&outpoint).unwrap();
        assert_eq!(utxo.amount, 77);
        assert_eq!(utxo.origin, outpoint);
    }

    #[test]
    fn spend_removes_referenced_outputs() {
        let view = UtxoView::new();
        let creator = payment_tx(10);
        view.add_tx_outputs(&creator);
        assert_eq!(view.len(), 1);

        let spender = Transaction::new(vec![Message::Payment(PaymentPayload::new(
            vec![Input::new(OutPoint::new(creator.hash(), 0, 0), vec![1])],
            vec![],
        ))]);
        view.spend_tx_inputs(&spender);
        assert!(view.is_empty());
    }
}

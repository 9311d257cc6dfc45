//! The ordered validation pipeline.

use crate::ValidationCode;
use ptn_crypto::{pubkey_to_address, verify_signature};
use ptn_store::{ChainState, TxQuery, UtxoQuery};
use ptn_types::{
    ContractReadSet, Hash, Message, PaymentPayload, Transaction, Utxo, TX_MAX_SIZE,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Transaction validator.
///
/// All state access goes through the injected queries; `validate_tx` never
/// mutates anything. The state query is optional so stateless callers (e.g.
/// tests, light tooling) can still run the structural checks.
pub struct Validate {
    utxo: Arc<dyn UtxoQuery>,
    txs: Arc<dyn TxQuery>,
    state: Option<Arc<dyn ChainState>>,
}

impl Validate {
    pub fn new(
        utxo: Arc<dyn UtxoQuery>,
        txs: Arc<dyn TxQuery>,
        state: Option<Arc<dyn ChainState>>,
    ) -> Self {
        Self { utxo, txs, state }
    }

    /// Run the full pipeline. First failure wins.
    pub fn validate_tx(&self, tx: &Transaction, is_coinbase: bool) -> ValidationCode {
        // 1. Structure: non-empty, fee-paying payment first.
        if tx.messages.is_empty() {
            return ValidationCode::InvalidMsg;
        }
        if !matches!(tx.messages[0], Message::Payment(_)) {
            return ValidationCode::InvalidMsg;
        }

        // 2. Already committed?
        if self.txs.contains_tx(&tx.hash()) {
            return ValidationCode::DuplicateTxId;
        }

        // 3. Fee floor. The fee query must succeed even when no floor is
        // configured.
        if !is_coinbase && !self.validate_fee(tx) {
            return ValidationCode::InvalidFee;
        }

        // 4. Size cap.
        if tx.size() > TX_MAX_SIZE {
            debug!(size = tx.size(), "transaction over size cap");
            return ValidationCode::NotCompareSize;
        }

        // 5. Input unlock scripts.
        if !is_coinbase && !self.validate_input_scripts(tx) {
            return ValidationCode::BadCreatorSignature;
        }

        // 6. Per-payload checks.
        for msg in &tx.messages {
            let code = self.validate_payload(tx, msg, is_coinbase);
            if !code.is_valid() {
                return code;
            }
        }
        ValidationCode::Valid
    }

    fn validate_fee(&self, tx: &Transaction) -> bool {
        let fee = match tx.fee(|op| self.utxo.utxo(op)) {
            Ok(fee) => fee,
            Err(err) => {
                debug!(%err, "fee computation failed");
                return false;
            }
        };
        let Some(state) = &self.state else {
            warn!("cannot check fee floor, no state query configured");
            return true;
        };
        match state.min_fee() {
            Some((min, asset)) if min > 0 => asset.is_gas() && fee >= min,
            _ => true,
        }
    }

    /// Every payment input script must unlock the referenced UTXO: the
    /// embedded key hashes to the UTXO's locking address and the signature
    /// covers the transaction's signing hash. Inputs whose UTXO cannot be
    /// resolved are left for the payment payload check to report.
    fn validate_input_scripts(&self, tx: &Transaction) -> bool {
        let signing_hash = tx.signing_hash();
        for msg in &tx.messages {
            let Message::Payment(p) = msg else { continue };
            for input in &p.inputs {
                if input.is_coinbase() {
                    continue;
                }
                let Some(utxo) = self.utxo.utxo(&input.previous_outpoint) else {
                    continue;
                };
                if !script_unlocks(&input.signature_script, &utxo, &signing_hash) {
                    return false;
                }
            }
        }
        true
    }

    fn validate_payload(
        &self,
        tx: &Transaction,
        msg: &Message,
        is_coinbase: bool,
    ) -> ValidationCode {
        match msg {
            Message::Payment(p) => self.validate_payment(p, is_coinbase),
            Message::ContractTplRequest(p) => {
                if p.tpl_name.is_empty() || p.path.is_empty() || p.version.is_empty() {
                    ValidationCode::InvalidContract
                } else {
                    ValidationCode::Valid
                }
            }
            Message::ContractDeployRequest(p) => {
                if p.tpl_id.is_empty() || p.tx_id.is_empty() {
                    return ValidationCode::InvalidContract;
                }
                if let Some(state) = &self.state {
                    if !state.template_exists(&p.tpl_id) {
                        return ValidationCode::InvalidContract;
                    }
                }
                ValidationCode::Valid
            }
            Message::ContractInvokeRequest(p) => {
                if p.contract_id.is_empty() {
                    ValidationCode::InvalidContract
                } else {
                    ValidationCode::Valid
                }
            }
            Message::ContractStopRequest(p) => {
                if p.contract_id.is_empty() {
                    ValidationCode::InvalidContract
                } else {
                    ValidationCode::Valid
                }
            }
            Message::ContractTpl(p) => {
                if p.template_id.is_empty() || p.bytecode.is_empty() {
                    ValidationCode::InvalidContract
                } else {
                    ValidationCode::Valid
                }
            }
            Message::ContractDeploy(p) => self.validate_contract_state(&p.contract_id, &p.read_set),
            Message::ContractInvoke(p) => self.validate_contract_state(&p.contract_id, &p.read_set),
            Message::ContractStop(p) => self.validate_contract_state(&p.contract_id, &p.read_set),
            Message::Signature(p) => {
                let result_hash = tx.result_signing_hash();
                for entry in &p.signatures {
                    if !verify_signature(&entry.pub_key, &entry.signature, result_hash.as_bytes())
                    {
                        return ValidationCode::BadCreatorSignature;
                    }
                }
                ValidationCode::Valid
            }
            Message::Data(p) => {
                if p.main_data.is_empty() {
                    ValidationCode::InvalidDataPayload
                } else {
                    ValidationCode::Valid
                }
            }
            Message::Config(_) | Message::Vote(_) | Message::MediatorCreate(_) => {
                ValidationCode::Valid
            }
        }
    }

    fn validate_payment(&self, p: &PaymentPayload, is_coinbase: bool) -> ValidationCode {
        if is_coinbase {
            // A coinbase carries exactly one synthetic input.
            let ok = p.inputs.len() == 1 && p.inputs[0].is_coinbase();
            return if ok {
                ValidationCode::Valid
            } else {
                ValidationCode::InvalidPaymentload
            };
        }

        let mut seen = HashSet::new();
        let mut input_sums: HashMap<ptn_types::Asset, u64> = HashMap::new();
        let mut output_sums: HashMap<ptn_types::Asset, u64> = HashMap::new();

        for input in &p.inputs {
            if input.is_coinbase() {
                return ValidationCode::InvalidPaymentload;
            }
            if !seen.insert(input.previous_outpoint) {
                return ValidationCode::InvalidPaymentload;
            }
            let Some(utxo) = self.utxo.utxo(&input.previous_outpoint) else {
                return ValidationCode::InvalidPaymentload;
            };
            *input_sums.entry(utxo.asset).or_default() += utxo.amount;
        }
        for output in &p.outputs {
            *output_sums.entry(output.asset).or_default() += output.value;
        }
        for (asset, out_sum) in &output_sums {
            if input_sums.get(asset).copied().unwrap_or(0) < *out_sum {
                return ValidationCode::InvalidPaymentload;
            }
        }
        ValidationCode::Valid
    }

    fn validate_contract_state(
        &self,
        contract_id: &[u8],
        read_set: &[ContractReadSet],
    ) -> ValidationCode {
        let Some(state) = &self.state else {
            return ValidationCode::Valid;
        };
        for entry in read_set {
            match state.read_version(contract_id, &entry.key) {
                Some(version) if version == entry.version => {}
                _ => return ValidationCode::InvalidContract,
            }
        }
        ValidationCode::Valid
    }
}

/// Parse an unlock script (`pubkey ‖ 65-byte signature`) and check it against
/// the UTXO's locking address and the signing hash.
fn script_unlocks(script: &[u8], utxo: &Utxo, signing_hash: &Hash) -> bool {
    if script.len() <= 65 {
        return false;
    }
    let (pubkey, sig) = script.split_at(script.len() - 65);
    let Ok(addr) = pubkey_to_address(pubkey) else {
        return false;
    };
    if utxo.pk_script != addr.as_bytes() {
        return false;
    }
    verify_signature(pubkey, sig, signing_hash.as_bytes())
}

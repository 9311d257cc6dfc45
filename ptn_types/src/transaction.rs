//! Transactions: ordered message lists with content-addressed identity.

use crate::message::encode_payment_unsigned;
use crate::{Encoder, Hash, Message, OutPoint, PtnError, SignaturePayload, Utxo};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

/// Maximum serialized transaction size: 256 KiB.
pub const TX_MAX_SIZE: usize = 256 * 1024;

/// An ordered list of messages.
///
/// Message 0 must be a fee-paying payment. A transaction is a *request* when
/// it carries a `*Request` contract message and a *result* once the jury has
/// appended the corresponding result (and signature) messages; both forms
/// share one [`request_hash`](Self::request_hash).
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Transaction {
    pub messages: Vec<Message>,
}

fn keccak(bytes: &[u8]) -> Hash {
    let digest = Keccak256::digest(bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    Hash::new(out)
}

impl Transaction {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn add_message(&mut self, msg: Message) {
        self.messages.push(msg);
    }

    /// Canonical encoding of the full message list.
    pub fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        enc.write_u32(self.messages.len() as u32);
        for msg in &self.messages {
            msg.encode_into(&mut enc);
        }
        enc.finish()
    }

    /// Full transaction hash.
    pub fn hash(&self) -> Hash {
        keccak(&self.encode())
    }

    /// Serialized size in bytes.
    pub fn size(&self) -> usize {
        self.encode().len()
    }

    /// Hash of the request-only view: signature messages and contract result
    /// messages are excluded, so a request and its result hash identically.
    pub fn request_hash(&self) -> Hash {
        let mut enc = Encoder::new();
        let kept: Vec<&Message> = self
            .messages
            .iter()
            .filter(|m| !matches!(m, Message::Signature(_)) && !m.is_contract_result())
            .collect();
        enc.write_u32(kept.len() as u32);
        for msg in kept {
            msg.encode_into(&mut enc);
        }
        keccak(&enc.finish())
    }

    /// Hash covered by payment input unlock scripts: the request-only view
    /// with every unlock script blanked. Stable when the jury appends result
    /// and signature messages, so the creator's input signatures survive
    /// execution.
    pub fn signing_hash(&self) -> Hash {
        let mut enc = Encoder::new();
        let kept: Vec<&Message> = self
            .messages
            .iter()
            .filter(|m| !matches!(m, Message::Signature(_)) && !m.is_contract_result())
            .collect();
        enc.write_u32(kept.len() as u32);
        for msg in kept {
            match msg {
                Message::Payment(p) => {
                    enc.write_u8(msg.app() as u8);
                    encode_payment_unsigned(p, &mut enc);
                }
                other => other.encode_into(&mut enc),
            }
        }
        keccak(&enc.finish())
    }

    /// Hash covered by jury and producer signature entries: every message
    /// except the signature messages themselves. Unlike
    /// [`signing_hash`](Self::signing_hash) this commits to the contract
    /// result messages, so a juror signature attests the execution outcome.
    pub fn result_signing_hash(&self) -> Hash {
        let mut enc = Encoder::new();
        let kept: Vec<&Message> = self
            .messages
            .iter()
            .filter(|m| !matches!(m, Message::Signature(_)))
            .collect();
        enc.write_u32(kept.len() as u32);
        for msg in kept {
            msg.encode_into(&mut enc);
        }
        keccak(&enc.finish())
    }

    /// The request-only view of this transaction (result and signature
    /// messages stripped). Identity: `tx.request_view().hash() ==
    /// tx.request_hash()` would not hold in general because the full hash
    /// covers signature scripts; use [`request_hash`](Self::request_hash) for
    /// keying.
    pub fn request_view(&self) -> Transaction {
        Transaction::new(
            self.messages
                .iter()
                .filter(|m| !matches!(m, Message::Signature(_)) && !m.is_contract_result())
                .cloned()
                .collect(),
        )
    }

    /// Whether this transaction carries a contract request message.
    pub fn is_request(&self) -> bool {
        self.messages.iter().any(|m| m.is_contract_request())
    }

    /// Whether any contract message (request or result) is present.
    pub fn is_contract(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.is_contract_request() || m.is_contract_result())
    }

    /// System contracts run on mediators during unit construction; user
    /// contracts need a jury. An invoke request targets a system contract
    /// when its contract id carries the zero prefix byte; install, deploy
    /// and stop requests are always user contracts. A transaction with no
    /// contract request is treated as system (nothing to sandbox).
    pub fn is_system_contract(&self) -> bool {
        for msg in &self.messages {
            match msg {
                Message::ContractInvokeRequest(p) => {
                    return p.contract_id.first() == Some(&0u8);
                }
                m if m.is_contract_request() => return false,
                _ => {}
            }
        }
        true
    }

    /// First signature message, if any.
    pub fn signature_payload(&self) -> Option<&SignaturePayload> {
        self.messages.iter().find_map(|m| match m {
            Message::Signature(p) => Some(p),
            _ => None,
        })
    }

    pub fn signature_payload_mut(&mut self) -> Option<&mut SignaturePayload> {
        self.messages.iter_mut().find_map(|m| match m {
            Message::Signature(p) => Some(p),
            _ => None,
        })
    }

    /// Number of collected jury signatures.
    pub fn signature_count(&self) -> usize {
        self.signature_payload().map_or(0, |p| p.signatures.len())
    }

    /// All payment input outpoints, in message order. Coinbase inputs are
    /// skipped.
    pub fn input_outpoints(&self) -> Vec<OutPoint> {
        let mut outs = Vec::new();
        for msg in &self.messages {
            if let Message::Payment(p) = msg {
                for input in &p.inputs {
                    if !input.is_coinbase() {
                        outs.push(input.previous_outpoint);
                    }
                }
            }
        }
        outs
    }

    /// Fee in the gas asset: gas inputs minus gas outputs, resolved through
    /// the supplied UTXO lookup.
    pub fn fee<F>(&self, lookup: F) -> Result<u64, PtnError>
    where
        F: Fn(&OutPoint) -> Option<Utxo>,
    {
        let mut inputs: u64 = 0;
        let mut outputs: u64 = 0;
        for msg in &self.messages {
            if let Message::Payment(p) = msg {
                for input in &p.inputs {
                    if input.is_coinbase() {
                        continue;
                    }
                    let utxo = lookup(&input.previous_outpoint).ok_or_else(|| {
                        PtnError::UtxoNotFound(input.previous_outpoint.to_string())
                    })?;
                    if utxo.asset.is_gas() {
                        inputs = inputs.saturating_add(utxo.amount);
                    }
                }
                for output in &p.outputs {
                    if output.asset.is_gas() {
                        outputs = outputs.saturating_add(output.value);
                    }
                }
            }
        }
        inputs
            .checked_sub(outputs)
            .ok_or(PtnError::NegativeFee { inputs, outputs })
    }
}

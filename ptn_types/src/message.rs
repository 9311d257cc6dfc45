//! Transaction messages: a closed sum type over every application payload.
//!
//! The original interface-and-reflection design becomes a tagged enum here:
//! a message whose tag disagrees with its payload is unrepresentable, and
//! payload dispatch is an exhaustive `match`.

use crate::{Address, Asset, Encoder, OutPoint};
use serde::{Deserialize, Serialize};

/// Message application tag. The discriminant doubles as the codec byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageApp {
    Payment = 0,
    ContractTpl = 1,
    ContractDeploy = 2,
    ContractInvoke = 3,
    ContractStop = 4,
    ContractTplRequest = 5,
    ContractDeployRequest = 6,
    ContractInvokeRequest = 7,
    ContractStopRequest = 8,
    Signature = 9,
    Config = 10,
    Data = 11,
    Vote = 12,
    MediatorCreate = 13,
}

/// One input of a payment message.
///
/// `signature_script` unlocks the referenced UTXO: the owner's SEC1 public
/// key (33 or 65 bytes) followed by a 65-byte recoverable signature over the
/// transaction's signing hash. Coinbase transactions carry a single synthetic
/// input with an empty script and a zero outpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    pub previous_outpoint: OutPoint,
    pub signature_script: Vec<u8>,
}

impl Input {
    pub fn new(previous_outpoint: OutPoint, signature_script: Vec<u8>) -> Self {
        Self {
            previous_outpoint,
            signature_script,
        }
    }

    /// The synthetic input of a coinbase payment.
    pub fn coinbase() -> Self {
        Self {
            previous_outpoint: OutPoint::new(crate::Hash::ZERO, 0, 0),
            signature_script: Vec::new(),
        }
    }

    pub fn is_coinbase(&self) -> bool {
        self.previous_outpoint.tx_hash.is_zero() && self.signature_script.is_empty()
    }
}

/// One output of a payment message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub value: u64,
    /// Locking script: the 20-byte owner address.
    pub pk_script: Vec<u8>,
    pub asset: Asset,
}

impl Output {
    pub fn new(value: u64, owner: &Address, asset: Asset) -> Self {
        Self {
            value,
            pk_script: owner.as_bytes().to_vec(),
            asset,
        }
    }
}

/// Token transfer; message 0 of every transaction pays the fee.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaymentPayload {
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    pub lock_time: u32,
}

impl PaymentPayload {
    pub fn new(inputs: Vec<Input>, outputs: Vec<Output>) -> Self {
        Self {
            inputs,
            outputs,
            lock_time: 0,
        }
    }

    pub fn add_input(&mut self, input: Input) {
        self.inputs.push(input);
    }

    pub fn add_output(&mut self, output: Output) {
        self.outputs.push(output);
    }
}

/// A contract state read with the version it was observed at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractReadSet {
    pub key: String,
    pub version: u64,
}

/// A contract state write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractWriteSet {
    pub key: String,
    pub value: Vec<u8>,
}

/// Result of installing a contract template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractTplPayload {
    pub template_id: Vec<u8>,
    pub name: String,
    pub path: String,
    pub version: String,
    pub memory: u16,
    pub bytecode: Vec<u8>,
}

/// Result of deploying a contract instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDeployPayload {
    pub template_id: Vec<u8>,
    pub contract_id: Vec<u8>,
    pub name: String,
    pub args: Vec<Vec<u8>>,
    pub execution_time_ms: u64,
    /// Jury assigned to this contract at deploy time.
    pub jury: Vec<Address>,
    pub read_set: Vec<ContractReadSet>,
    pub write_set: Vec<ContractWriteSet>,
}

/// Result of invoking a contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractInvokePayload {
    pub contract_id: Vec<u8>,
    pub args: Vec<Vec<u8>>,
    pub execution_time_ms: u64,
    pub read_set: Vec<ContractReadSet>,
    pub write_set: Vec<ContractWriteSet>,
    /// Opaque return value of the invocation.
    pub payload: Vec<u8>,
}

/// Result of stopping a contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractStopPayload {
    pub contract_id: Vec<u8>,
    pub read_set: Vec<ContractReadSet>,
    pub write_set: Vec<ContractWriteSet>,
}

/// Request to install a contract template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractTplRequestPayload {
    pub tpl_name: String,
    pub path: String,
    pub version: String,
}

/// Request to deploy a contract instance from an installed template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDeployRequestPayload {
    pub tpl_id: Vec<u8>,
    pub tx_id: String,
    pub args: Vec<Vec<u8>>,
    pub timeout_secs: u64,
}

/// Request to invoke a deployed contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractInvokeRequestPayload {
    pub contract_id: Vec<u8>,
    pub function_name: String,
    pub args: Vec<Vec<u8>>,
    pub timeout_secs: u64,
}

/// Request to stop a deployed contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractStopRequestPayload {
    pub contract_id: Vec<u8>,
    pub tx_id: String,
    pub delete_image: bool,
}

/// One `{pubkey, signature}` pair inside a signature message.
///
/// Both fields are raw wire bytes: the key may be compressed or uncompressed
/// SEC1 and the signature is the 65-byte recoverable form. The jury leader
/// rule compares `signature` bytes lexicographically, so the representation
/// is deliberately not normalized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEntry {
    pub pub_key: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Multi-party signatures over the transaction-sans-signatures hash.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignaturePayload {
    pub signatures: Vec<SignatureEntry>,
}

/// Chain parameter change (applied at maintenance).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigPayload {
    pub key: String,
    pub value: Vec<u8>,
}

/// Arbitrary application data anchored on chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataPayload {
    pub main_data: Vec<u8>,
    pub extra_data: Vec<u8>,
}

/// Mediator vote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotePayload {
    pub address: Vec<u8>,
    pub expired_term: u16,
}

/// Mediator registration operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediatorCreateOperation {
    pub account: Address,
    /// Initial DKS public key for the VSS protocol, hex-encoded.
    pub init_pub_key: String,
    /// Network endpoint of the mediator node.
    pub node: String,
    pub url: String,
}

/// A transaction message: application tag + payload, as one closed sum.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    Payment(PaymentPayload),
    ContractTpl(ContractTplPayload),
    ContractDeploy(ContractDeployPayload),
    ContractInvoke(ContractInvokePayload),
    ContractStop(ContractStopPayload),
    ContractTplRequest(ContractTplRequestPayload),
    ContractDeployRequest(ContractDeployRequestPayload),
    ContractInvokeRequest(ContractInvokeRequestPayload),
    ContractStopRequest(ContractStopRequestPayload),
    Signature(SignaturePayload),
    Config(ConfigPayload),
    Data(DataPayload),
    Vote(VotePayload),
    MediatorCreate(MediatorCreateOperation),
}

impl Message {
    pub fn app(&self) -> MessageApp {
        match self {
            Message::Payment(_) => MessageApp::Payment,
            Message::ContractTpl(_) => MessageApp::ContractTpl,
            Message::ContractDeploy(_) => MessageApp::ContractDeploy,
            Message::ContractInvoke(_) => MessageApp::ContractInvoke,
            Message::ContractStop(_) => MessageApp::ContractStop,
            Message::ContractTplRequest(_) => MessageApp::ContractTplRequest,
            Message::ContractDeployRequest(_) => MessageApp::ContractDeployRequest,
            Message::ContractInvokeRequest(_) => MessageApp::ContractInvokeRequest,
            Message::ContractStopRequest(_) => MessageApp::ContractStopRequest,
            Message::Signature(_) => MessageApp::Signature,
            Message::Config(_) => MessageApp::Config,
            Message::Data(_) => MessageApp::Data,
            Message::Vote(_) => MessageApp::Vote,
            Message::MediatorCreate(_) => MessageApp::MediatorCreate,
        }
    }

    /// Whether this is one of the `*_REQUEST` contract messages.
    pub fn is_contract_request(&self) -> bool {
        matches!(
            self,
            Message::ContractTplRequest(_)
                | Message::ContractDeployRequest(_)
                | Message::ContractInvokeRequest(_)
                | Message::ContractStopRequest(_)
        )
    }

    /// Whether this is a contract execution result message.
    pub fn is_contract_result(&self) -> bool {
        matches!(
            self,
            Message::ContractTpl(_)
                | Message::ContractDeploy(_)
                | Message::ContractInvoke(_)
                | Message::ContractStop(_)
        )
    }

    /// Canonical encoding, used for hashing and size accounting.
    pub fn encode_into(&self, enc: &mut Encoder) {
        enc.write_u8(self.app() as u8);
        match self {
            Message::Payment(p) => encode_payment(p, enc),
            Message::ContractTpl(p) => {
                enc.write_bytes(&p.template_id);
                enc.write_str(&p.name);
                enc.write_str(&p.path);
                enc.write_str(&p.version);
                enc.write_u16(p.memory);
                enc.write_bytes(&p.bytecode);
            }
            Message::ContractDeploy(p) => {
                enc.write_bytes(&p.template_id);
                enc.write_bytes(&p.contract_id);
                enc.write_str(&p.name);
                encode_args(&p.args, enc);
                enc.write_u64(p.execution_time_ms);
                enc.write_u32(p.jury.len() as u32);
                for addr in &p.jury {
                    enc.write_array(addr.as_bytes());
                }
                encode_read_set(&p.read_set, enc);
                encode_write_set(&p.write_set, enc);
            }
            Message::ContractInvoke(p) => {
                enc.write_bytes(&p.contract_id);
                encode_args(&p.args, enc);
                enc.write_u64(p.execution_time_ms);
                encode_read_set(&p.read_set, enc);
                encode_write_set(&p.write_set, enc);
                enc.write_bytes(&p.payload);
            }
            Message::ContractStop(p) => {
                enc.write_bytes(&p.contract_id);
                encode_read_set(&p.read_set, enc);
                encode_write_set(&p.write_set, enc);
            }
            Message::ContractTplRequest(p) => {
                enc.write_str(&p.tpl_name);
                enc.write_str(&p.path);
                enc.write_str(&p.version);
            }
            Message::ContractDeployRequest(p) => {
                enc.write_bytes(&p.tpl_id);
                enc.write_str(&p.tx_id);
                encode_args(&p.args, enc);
                enc.write_u64(p.timeout_secs);
            }
            Message::ContractInvokeRequest(p) => {
                enc.write_bytes(&p.contract_id);
                enc.write_str(&p.function_name);
                encode_args(&p.args, enc);
                enc.write_u64(p.timeout_secs);
            }
            Message::ContractStopRequest(p) => {
                enc.write_bytes(&p.contract_id);
                enc.write_str(&p.tx_id);
                enc.write_bool(p.delete_image);
            }
            Message::Signature(p) => {
                enc.write_u32(p.signatures.len() as u32);
                for entry in &p.signatures {
                    enc.write_bytes(&entry.pub_key);
                    enc.write_bytes(&entry.signature);
                }
            }
            Message::Config(p) => {
                enc.write_str(&p.key);
                enc.write_bytes(&p.value);
            }
            Message::Data(p) => {
                enc.write_bytes(&p.main_data);
                enc.write_bytes(&p.extra_data);
            }
            Message::Vote(p) => {
                enc.write_bytes(&p.address);
                enc.write_u16(p.expired_term);
            }
            Message::MediatorCreate(p) => {
                enc.write_array(p.account.as_bytes());
                enc.write_str(&p.init_pub_key);
                enc.write_str(&p.node);
                enc.write_str(&p.url);
            }
        }
    }
}

fn encode_payment(p: &PaymentPayload, enc: &mut Encoder) {
    enc.write_u32(p.inputs.len() as u32);
    for input in &p.inputs {
        enc.write_array(input.previous_outpoint.tx_hash.as_bytes());
        enc.write_u32(input.previous_outpoint.message_index);
        enc.write_u32(input.previous_outpoint.out_index);
        enc.write_bytes(&input.signature_script);
    }
    enc.write_u32(p.outputs.len() as u32);
    for output in &p.outputs {
        enc.write_u64(output.value);
        enc.write_bytes(&output.pk_script);
        enc.write_array(&output.asset.asset_id);
        enc.write_array(&output.asset.unique_id);
        enc.write_u64(output.asset.chain_id);
    }
    enc.write_u32(p.lock_time);
}

/// Payment encoding with all signature scripts blanked, used for the signing
/// hash so a signature never covers itself.
pub(crate) fn encode_payment_unsigned(p: &PaymentPayload, enc: &mut Encoder) {
    enc.write_u32(p.inputs.len() as u32);
    for input in &p.inputs {
        enc.write_array(input.previous_outpoint.tx_hash.as_bytes());
        enc.write_u32(input.previous_outpoint.message_index);
        enc.write_u32(input.previous_outpoint.out_index);
        enc.write_bytes(&[]);
    }
    enc.write_u32(p.outputs.len() as u32);
    for output in &p.outputs {
        enc.write_u64(output.value);
        enc.write_bytes(&output.pk_script);
        enc.write_array(&output.asset.asset_id);
        enc.write_array(&output.asset.unique_id);
        enc.write_u64(output.asset.chain_id);
    }
    enc.write_u32(p.lock_time);
}

fn encode_args(args: &[Vec<u8>], enc: &mut Encoder) {
    enc.write_u32(args.len() as u32);
    for arg in args {
        enc.write_bytes(arg);
    }
}

fn encode_read_set(set: &[ContractReadSet], enc: &mut Encoder) {
    enc.write_u32(set.len() as u32);
    for entry in set {
        enc.write_str(&entry.key);
        enc.write_u64(entry.version);
    }
}

fn encode_write_set(set: &[ContractWriteSet], enc: &mut Encoder) {
    enc.write_u32(set.len() as u32);
    for entry in set {
        enc.write_str(&entry.key);
        enc.write_bytes(&entry.value);
    }
}

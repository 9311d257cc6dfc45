//! Fundamental types for the PTN DAG ledger.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: hashes, addresses, assets, UTXOs, transaction messages, chain
//! properties, units, events, and the canonical codec used for hashing.

pub mod address;
pub mod asset;
pub mod codec;
pub mod error;
pub mod event;
pub mod hash;
pub mod keys;
pub mod message;
pub mod outpoint;
pub mod params;
pub mod properties;
pub mod time;
pub mod transaction;
pub mod unit;
pub mod utxo;

pub use address::Address;
pub use asset::Asset;
pub use codec::Encoder;
pub use error::PtnError;
pub use event::{ChainHeadEvent, ChainMaintainEvent, TxPreEvent};
pub use hash::Hash;
pub use keys::{KeyPair, PrivateKey, PublicKey};
pub use message::{
    ConfigPayload, ContractDeployPayload, ContractDeployRequestPayload, ContractInvokePayload,
    ContractInvokeRequestPayload, ContractReadSet, ContractStopPayload,
    ContractStopRequestPayload, ContractTplPayload, ContractTplRequestPayload, ContractWriteSet,
    DataPayload, Input, MediatorCreateOperation, Message, MessageApp, Output, PaymentPayload,
    SignatureEntry, SignaturePayload, VotePayload,
};
pub use outpoint::OutPoint;
pub use params::ChainParameters;
pub use properties::{DynamicGlobalProperty, GlobalProperty, Mediator, MediatorSchedule};
pub use time::Timestamp;
pub use transaction::{Transaction, TX_MAX_SIZE};
pub use unit::{Header, Unit};
pub use utxo::Utxo;

//! Peer-visible contract and election events.

use ptn_types::{Hash, Transaction};

/// Phase an incoming contract event drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContractEventType {
    /// Start (or extend) the jury election for a request.
    Ele,
    /// Execute the request (jury/mediator nodes only).
    Exec,
    /// A juror's signed execution result.
    Sig,
    /// The aggregated, committed result.
    Commit,
}

/// One elected jury candidate.
///
/// `proof` is the candidate's signature over the request id; `addr_hash`
/// blinds the candidate address until the request is executed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElectionInfo {
    pub addr_hash: Hash,
    pub proof: Vec<u8>,
    pub public_key: Vec<u8>,
}

/// Contract event broadcast between peers.
#[derive(Clone, Debug)]
pub struct ContractEvent {
    pub ctype: ContractEventType,
    pub tx: Transaction,
    pub ele: Vec<ElectionInfo>,
}

/// Ask peers for additional election candidates.
#[derive(Clone, Debug)]
pub struct ElectionRequestEvent {
    pub req_id: Hash,
}

/// A peer's election candidate answer.
#[derive(Clone, Debug)]
pub struct ElectionResultEvent {
    pub req_id: Hash,
    pub ele: ElectionInfo,
}

/// Election protocol event.
#[derive(Clone, Debug)]
pub enum ElectionEvent {
    VrfRequest(ElectionRequestEvent),
    VrfResult(ElectionResultEvent),
}

//! World-state queries: contract storage versions, fee floor, and the
//! active mediator / jury rosters.

use parking_lot::RwLock;
use ptn_types::{Address, Asset};
use std::collections::{HashMap, HashSet};

/// Read-only world state consulted by the validator and the contract
/// processor.
pub trait ChainState: Send + Sync {
    /// Configured minimum fee in the gas asset; `None` disables the floor.
    fn min_fee(&self) -> Option<(u64, Asset)>;

    /// Current version of one contract storage key, if it exists.
    fn read_version(&self, contract_id: &[u8], key: &str) -> Option<u64>;

    /// Whether an installed template with this id exists.
    fn template_exists(&self, tpl_id: &[u8]) -> bool;

    fn is_active_mediator(&self, addr: &Address) -> bool;

    fn is_active_jury(&self, addr: &Address) -> bool;

    /// Jury assigned to a deployed contract, in deploy order.
    fn contract_jury(&self, contract_id: &[u8]) -> Vec<Address>;

    /// Whether the account is a registered mediator (active or standby).
    fn is_mediator(&self, addr: &Address) -> bool;

    /// Whether the account's mediator deposit has been approved.
    fn deposit_paid(&self, addr: &Address) -> bool;
}

/// In-memory world state, seeded by tests and single-process deployments.
#[derive(Default)]
pub struct MemoryState {
    inner: RwLock<MemoryStateInner>,
}

#[derive(Default)]
struct MemoryStateInner {
    min_fee: Option<(u64, Asset)>,
    versions: HashMap<(Vec<u8>, String), u64>,
    templates: HashSet<Vec<u8>>,
    active_mediators: HashSet<Address>,
    active_juries: HashSet<Address>,
    juries_by_contract: HashMap<Vec<u8>, Vec<Address>>,
    mediators: HashSet<Address>,
    deposits: HashSet<Address>,
}

impl MemoryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_min_fee(&self, amount: u64, asset: Asset) {
        self.inner.write().min_fee = Some((amount, asset));
    }

    pub fn set_version(&self, contract_id: &[u8], key: &str, version: u64) {
        self.inner
            .write()
            .versions
            .insert((contract_id.to_vec(), key.to_string()), version);
    }

    pub fn add_template(&self, tpl_id: &[u8]) {
        self.inner.write().templates.insert(tpl_id.to_vec());
    }

    pub fn add_active_mediator(&self, addr: Address) {
        let mut inner = self.inner.write();
        inner.active_mediators.insert(addr);
        inner.mediators.insert(addr);
    }

    pub fn add_active_jury(&self, addr: Address) {
        self.inner.write().active_juries.insert(addr);
    }

    pub fn assign_jury(&self, contract_id: &[u8], jury: Vec<Address>) {
        self.inner
            .write()
            .juries_by_contract
            .insert(contract_id.to_vec(), jury);
    }

    pub fn add_mediator(&self, addr: Address) {
        self.inner.write().mediators.insert(addr);
    }

    pub fn approve_deposit(&self, addr: Address) {
        self.inner.write().deposits.insert(addr);
    }
}

impl ChainState for MemoryState {
    fn min_fee(&self) -> Option<(u64, Asset)> {
        self.inner.read().min_fee
    }

    fn read_version(&self, contract_id: &[u8], key: &str) -> Option<u64> {
        self.inner
            .read()
            .versions
            .get(&(contract_id.to_vec(), key.to_string()))
            .copied()
    }

    fn template_exists(&self, tpl_id: &[u8]) -> bool {
        self.inner.read().templates.contains(tpl_id)
    }

    fn is_active_mediator(&self, addr: &Address) -> bool {
        self.inner.read().active_mediators.contains(addr)
    }

    fn is_active_jury(&self, addr: &Address) -> bool {
        self.inner.read().active_juries.contains(addr)
    }

    fn contract_jury(&self, contract_id: &[u8]) -> Vec<Address> {
        self.inner
            .read()
            .juries_by_contract
            .get(contract_id)
            .cloned()
            .unwrap_or_default()
    }

    fn is_mediator(&self, addr: &Address) -> bool {
        self.inner.read().mediators.contains(addr)
    }

    fn deposit_paid(&self, addr: &Address) -> bool {
        self.inner.read().deposits.contains(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::new([b; 20])
    }

    #[test]
    fn min_fee_defaults_to_unset() {
        let state = MemoryState::new();
        assert!(state.min_fee().is_none());
        state.set_min_fee(1, Asset::ptn());
        assert_eq!(state.min_fee().unwrap().0, 1);
    }

    #[test]
    fn roster_membership() {
        let state = MemoryState::new();
        state.add_active_mediator(addr(1));
        state.add_active_jury(addr(2));

        assert!(state.is_active_mediator(&addr(1)));
        assert!(state.is_mediator(&addr(1)));
        assert!(!state.is_active_mediator(&addr(2)));
        assert!(state.is_active_jury(&addr(2)));
    }

    #[test]
    fn contract_jury_assignment() {
        let state = MemoryState::new();
        assert!(state.contract_jury(b"c1").is_empty());
        state.assign_jury(b"c1", vec![addr(1), addr(2)]);
        assert_eq!(state.contract_jury(b"c1").len(), 2);
    }

    #[test]
    fn storage_versions() {
        let state = MemoryState::new();
        state.set_version(b"c1", "balance", 4);
        assert_eq!(state.read_version(b"c1", "balance"), Some(4));
        assert_eq!(state.read_version(b"c1", "missing"), None);
    }
}

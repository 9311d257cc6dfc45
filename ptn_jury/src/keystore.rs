//! Local signing accounts.

use crate::JuryError;
use parking_lot::RwLock;
use ptn_crypto::{pubkey_to_address, sign_hash};
use ptn_types::{Address, Hash, KeyPair, SignatureEntry};
use std::collections::BTreeMap;

/// Thread-safe store of this node's signing keys.
///
/// Wrapped in an `Arc` and shared between the processor, the node and the
/// API surface. The key material never leaves the store; callers get back
/// signature entries.
#[derive(Default)]
pub struct KeyStore {
    keys: RwLock<BTreeMap<Address, KeyPair>>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key pair, returning its account address.
    pub fn insert(&self, kp: KeyPair) -> Result<Address, JuryError> {
        let addr = pubkey_to_address(&kp.public.0)?;
        self.keys.write().insert(addr, kp);
        Ok(addr)
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.keys.read().keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.read().is_empty()
    }

    pub fn contains(&self, addr: &Address) -> bool {
        self.keys.read().contains_key(addr)
    }

    /// Sign a 32-byte hash with the given account.
    pub fn sign(&self, addr: &Address, hash: &Hash) -> Result<SignatureEntry, JuryError> {
        let keys = self.keys.read();
        let kp = keys
            .get(addr)
            .ok_or_else(|| JuryError::SignerMissing(addr.to_string()))?;
        let signature = sign_hash(&kp.private, hash.as_bytes())?;
        Ok(SignatureEntry {
            pub_key: kp.public.0.to_vec(),
            signature: signature.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ptn_crypto::{generate_keypair, verify_signature};

    #[test]
    fn insert_and_sign() {
        let ks = KeyStore::new();
        assert!(ks.is_empty());

        let addr = ks.insert(generate_keypair()).unwrap();
        assert!(ks.contains(&addr));
        assert_eq!(ks.addresses(), vec![addr]);

        let hash = Hash::new([9u8; 32]);
        let entry = ks.sign(&addr, &hash).unwrap();
        assert!(verify_signature(
            &entry.pub_key,
            &entry.signature,
            hash.as_bytes()
        ));
    }

    #[test]
    fn missing_key_errors() {
        let ks = KeyStore::new();
        let err = ks.sign(&Address::ZERO, &Hash::ZERO).unwrap_err();
        assert!(matches!(err, JuryError::SignerMissing(_)));
    }
}

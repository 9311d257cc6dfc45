//! Cryptographic primitives: Keccak-256 hashing and secp256k1 signatures.
//!
//! Signatures are 65 bytes (`r ‖ s ‖ recovery`), always low-S; verification
//! rejects malleable (high-S) signatures and accepts public keys in either
//! compressed or uncompressed SEC1 form.

pub mod hash;
pub mod keys;
pub mod sign;

pub use hash::keccak256;
pub use keys::{
    compress_pubkey, decompress_pubkey, generate_keypair, keypair_from_private, pubkey_to_address,
};
pub use sign::{sign_hash, verify_signature, SIGNATURE_LEN};

//! secp256k1 signing and verification over 32-byte message hashes.

use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use ptn_types::{PrivateKey, PtnError};

/// Length of a recoverable signature: `r(32) ‖ s(32) ‖ recovery(1)`.
pub const SIGNATURE_LEN: usize = 65;

/// Sign a 32-byte message hash, producing a 65-byte recoverable signature.
///
/// The `s` component is always in the lower half of the curve order.
pub fn sign_hash(private: &PrivateKey, msg_hash: &[u8; 32]) -> Result<[u8; 65], PtnError> {
    let signing = SigningKey::from_slice(&private.0).map_err(|_| PtnError::InvalidPublicKey)?;
    let (sig, recovery): (Signature, RecoveryId) = signing
        .sign_prehash_recoverable(msg_hash)
        .map_err(|_| PtnError::InvalidSignature)?;

    let mut out = [0u8; 65];
    out[..64].copy_from_slice(&sig.to_bytes());
    out[64] = recovery.to_byte();
    Ok(out)
}

/// Verify a signature against a 32-byte message hash.
///
/// Accepts the public key in compressed (33-byte) or uncompressed (65-byte)
/// SEC1 form, and the signature with (65 bytes) or without (64 bytes) its
/// recovery byte. Any malformed input (nil key, nil signature, short or
/// oversized buffers, a message that is not 32 bytes) verifies as `false`
/// without error, as does a malleable signature with `s > n/2`.
pub fn verify_signature(pubkey: &[u8], sig: &[u8], msg_hash: &[u8]) -> bool {
    if msg_hash.len() != 32 {
        return false;
    }
    let rs = match sig.len() {
        64 => &sig[..64],
        65 => &sig[..64],
        _ => return false,
    };
    let Ok(verifying) = VerifyingKey::from_sec1_bytes(pubkey) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(rs) else {
        return false;
    };
    // Malleability rejection: only low-S signatures verify.
    if signature.normalize_s().is_some() {
        return false;
    }
    verifying.verify_prehash(msg_hash, &signature).is_ok()
}

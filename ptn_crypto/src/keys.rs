//! secp256k1 key generation and public key encoding.

use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use ptn_types::{Address, KeyPair, PrivateKey, PtnError, PublicKey};
use rand::rngs::OsRng;

use crate::hash::keccak256;

/// Generate a fresh secp256k1 key pair.
pub fn generate_keypair() -> KeyPair {
    let signing = SigningKey::random(&mut OsRng);
    keypair_from_signing(&signing)
}

/// Derive the key pair for a 32-byte private scalar.
pub fn keypair_from_private(private: &[u8; 32]) -> Result<KeyPair, PtnError> {
    let signing = SigningKey::from_slice(private).map_err(|_| PtnError::InvalidPublicKey)?;
    Ok(keypair_from_signing(&signing))
}

fn keypair_from_signing(signing: &SigningKey) -> KeyPair {
    let point = signing.verifying_key().to_encoded_point(true);
    let mut compressed = [0u8; 33];
    compressed.copy_from_slice(point.as_bytes());

    KeyPair {
        public: PublicKey(compressed),
        private: PrivateKey(signing.to_bytes().into()),
    }
}

/// Expand a 33-byte compressed SEC1 key to its 65-byte uncompressed form.
///
/// Nil, truncated, oversized or off-curve inputs are errors.
pub fn decompress_pubkey(compressed: &[u8]) -> Result<[u8; 65], PtnError> {
    if compressed.len() != 33 {
        return Err(PtnError::InvalidPublicKey);
    }
    let key = k256::PublicKey::from_sec1_bytes(compressed).map_err(|_| PtnError::InvalidPublicKey)?;
    let point = key.to_encoded_point(false);
    let mut out = [0u8; 65];
    out.copy_from_slice(point.as_bytes());
    Ok(out)
}

/// Compress a 65-byte uncompressed SEC1 key to its 33-byte form.
pub fn compress_pubkey(uncompressed: &[u8]) -> Result<[u8; 33], PtnError> {
    if uncompressed.len() != 65 {
        return Err(PtnError::InvalidPublicKey);
    }
    let key =
        k256::PublicKey::from_sec1_bytes(uncompressed).map_err(|_| PtnError::InvalidPublicKey)?;
    let point = key.to_encoded_point(true);
    let mut out = [0u8; 33];
    out.copy_from_slice(point.as_bytes());
    Ok(out)
}

/// Derive the 20-byte account address for a public key in either SEC1 form:
/// the low 20 bytes of the Keccak-256 of the uncompressed point.
pub fn pubkey_to_address(pubkey: &[u8]) -> Result<Address, PtnError> {
    let uncompressed = match pubkey.len() {
        33 => decompress_pubkey(pubkey)?,
        65 => {
            // Validate the point before hashing.
            k256::PublicKey::from_sec1_bytes(pubkey).map_err(|_| PtnError::InvalidPublicKey)?;
            let mut out = [0u8; 65];
            out.copy_from_slice(pubkey);
            out
        }
        _ => return Err(PtnError::InvalidPublicKey),
    };
    let digest = keccak256(&uncompressed[1..]);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&digest.as_bytes()[12..]);
    Ok(Address::new(addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_is_compressed() {
        let kp = generate_keypair();
        let prefix = kp.public.0[0];
        assert!(prefix == 0x02 || prefix == 0x03);
    }

    #[test]
    fn compress_decompress_roundtrip() {
        let kp = generate_keypair();
        let uncompressed = decompress_pubkey(&kp.public.0).unwrap();
        assert_eq!(uncompressed[0], 0x04);
        let compressed = compress_pubkey(&uncompressed).unwrap();
        assert_eq!(compressed, kp.public.0);
    }

    #[test]
    fn known_key_decompression() {
        let compressed =
            hex::decode("02e32df42865e97135acfb65f3bae71bdc86f4d49150ad6a440b6f15878109880a")
                .unwrap();
        let uncompressed = decompress_pubkey(&compressed).unwrap();
        assert_eq!(
            hex::encode(uncompressed),
            "04e32df42865e97135acfb65f3bae71bdc86f4d49150ad6a440b6f15878109880a\
             0a2b2667f7e725ceea70c673093bf67663e0312623c8e091b13cf2c0f11ef652"
        );
        let recompressed = compress_pubkey(&uncompressed).unwrap();
        assert_eq!(recompressed.as_slice(), compressed.as_slice());
    }

    #[test]
    fn decompress_rejects_bad_input() {
        assert!(decompress_pubkey(&[]).is_err());
        assert!(decompress_pubkey(&[0x02; 5]).is_err());
        let mut long = vec![0x02; 33];
        long.extend_from_slice(&[1, 2, 3]);
        assert!(decompress_pubkey(&long).is_err());
    }

    #[test]
    fn address_is_stable_across_encodings() {
        let kp = generate_keypair();
        let uncompressed = decompress_pubkey(&kp.public.0).unwrap();
        let a1 = pubkey_to_address(&kp.public.0).unwrap();
        let a2 = pubkey_to_address(&uncompressed).unwrap();
        assert_eq!(a1, a2);
    }

    #[test]
    fn keypair_from_private_is_deterministic() {
        let seed = [0x11u8; 32];
        let kp1 = keypair_from_private(&seed).unwrap();
        let kp2 = keypair_from_private(&seed).unwrap();
        assert_eq!(kp1.public, kp2.public);
    }
}

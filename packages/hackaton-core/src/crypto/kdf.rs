//! # Key Derivation Functions
//!
//! ```text
//! signature bytes ──SHA-256──► seed (X25519 secret)
//!
//! X25519 output ──HKDF-SHA256(info = "hackaton-box-v1")──► AEAD key
//! ```
//!
//! | Aspect | Design Choice |
//! |--------|---------------|
//! | Seed digest | SHA-256, fixed 32-byte output |
//! | Box key | HKDF-SHA256 over the raw DH output |
//! | Key Separation | Distinct `info` strings per purpose |
//! | Version String | "-v1" suffix |

use hkdf::Hkdf;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Domain separation strings for HKDF and hashing
pub mod domain {
    /// Domain for the message box key
    pub const BOX_KEY: &[u8] = b"hackaton-box-v1";

    /// Domain for public key fingerprints
    pub const FINGERPRINT: &[u8] = b"hackaton-fingerprint-v1";
}

/// Hash a wallet signature into the 32-byte keypair seed
///
/// Deterministic: the same signature always gives the same seed, so a
/// wallet that signs deterministically reproduces its chat key on every
/// device.
pub fn seed_from_signature(signature: &[u8]) -> Zeroizing<[u8; 32]> {
    let digest = Sha256::digest(signature);
    let mut seed = Zeroizing::new([0u8; 32]);
    seed.copy_from_slice(&digest);
    seed
}

/// Expand a raw X25519 output into the XChaCha20-Poly1305 key
pub fn derive_box_key(dh_output: &[u8; 32]) -> Result<Zeroizing<[u8; 32]>> {
    let hkdf = Hkdf::<Sha256>::new(None, dh_output);

    let mut key = Zeroizing::new([0u8; 32]);
    hkdf.expand(domain::BOX_KEY, &mut key[..])
        .map_err(|_| Error::KeyDerivationFailed("Failed to derive box key".into()))?;

    Ok(key)
}

/// Short hex fingerprint of a public key
///
/// 16 hex characters, meant for humans comparing keys out-of-band.
pub fn compute_key_fingerprint(public_key: &[u8; 32]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(domain::FINGERPRINT);
    hasher.update(public_key);
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}

// ============================================================================
// TESTS
// ============================================================================

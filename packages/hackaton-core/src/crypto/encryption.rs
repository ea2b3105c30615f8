//! # Message Box
//!
//! Authenticated public-key encryption between two X25519 keypairs.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         BOX / OPEN                                      │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  SENDER                                                                 │
//! │  ─────────────────────────────────────────────────────────────────      │
//! │  1. shared  = X25519(sender_secret, recipient_public)                   │
//! │  2. key     = HKDF-SHA256(shared, "hackaton-box-v1")                    │
//! │  3. nonce   = 24 random bytes (OsRng), fresh for EVERY call             │
//! │  4. ct      = XChaCha20-Poly1305(key, nonce, plaintext)  (+16-byte tag) │
//! │  → EncryptedPayload { ct: base64, nonce: base64 }                       │
//! │                                                                         │
//! │  RECIPIENT                                                              │
//! │  ─────────────────────────────────────────────────────────────────      │
//! │  1. shared  = X25519(recipient_secret, sender_public)   [same value]    │
//! │  2. key     = HKDF-SHA256(shared, "hackaton-box-v1")                    │
//! │  3. plaintext or None (wrong key / tampered / truncated)                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Reporting
//!
//! [`decrypt`] returns `None` for every failure and never says which
//! check failed. [`try_decrypt`] separates malformed encodings (bad
//! base64, wrong nonce length, ciphertext shorter than the tag) so
//! callers can reject them before any cryptography runs.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::kdf::derive_box_key;
use super::keys::{EncryptionKeypair, PublicKey};
use crate::error::{Error, Result};

/// Size of the XChaCha20-Poly1305 nonce in bytes (192 bits)
pub const NONCE_SIZE: usize = 24;

/// Size of the Poly1305 authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// A 24-byte nonce
///
/// ## Critical Security Requirement
///
/// **NEVER reuse a nonce with the same key pair.** Only [`Nonce::random`]
/// is used on the encryption path; 192 random bits make collisions
/// negligible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Nonce([u8; NONCE_SIZE]);

impl Nonce {
    /// Generate a nonce from the OS CSPRNG
    pub fn random() -> Self {
        let mut bytes = [0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from existing bytes
    pub fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

/// An encrypted payload as it is stored and transported
///
/// Both fields are standard base64. Field names match the records the web
/// app already keeps (`{ "ct": ..., "nonce": ... }`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    /// Ciphertext with the Poly1305 tag appended (base64)
    pub ct: String,
    /// 24-byte nonce (base64)
    pub nonce: String,
}

impl EncryptedPayload {
    /// Encode a nonce and ciphertext
    pub fn new(nonce: &Nonce, ciphertext: &[u8]) -> Self {
        Self {
            ct: BASE64.encode(ciphertext),
            nonce: BASE64.encode(nonce.as_bytes()),
        }
    }

    /// Decode and validate both fields
    ///
    /// Fails with `InvalidEncoding` on bad base64, a nonce that is not
    /// 24 bytes, or a ciphertext too short to hold the tag.
    pub fn decode(&self) -> Result<(Nonce, Vec<u8>)> {
        let nonce_bytes = BASE64.decode(&self.nonce)?;
        let nonce_len = nonce_bytes.len();
        let nonce: [u8; NONCE_SIZE] = nonce_bytes.try_into().map_err(|_| {
            Error::InvalidEncoding(format!(
                "nonce must be {} bytes, got {}",
                NONCE_SIZE, nonce_len
            ))
        })?;

        let ciphertext = BASE64.decode(&self.ct)?;
        if ciphertext.len() < TAG_SIZE {
            return Err(Error::InvalidEncoding(format!(
                "ciphertext must be at least {} bytes, got {}",
                TAG_SIZE,
                ciphertext.len()
            )));
        }

        Ok((Nonce(nonce), ciphertext))
    }
}

/// Build the AEAD for a key pair
fn box_cipher(their_public: &PublicKey, ours: &EncryptionKeypair) -> Result<XChaCha20Poly1305> {
    let shared = ours.diffie_hellman(their_public);
    let key = derive_box_key(&shared)?;

    XChaCha20Poly1305::new_from_slice(&key[..])
        .map_err(|e| Error::EncryptionFailed(format!("Invalid key: {}", e)))
}

/// Encrypt `plaintext` so the holder of `recipient`'s secret key can read it
///
/// Pass our own public key as `recipient` to self-encrypt. A new random
/// nonce is drawn on every call, so encrypting the same plaintext twice
/// yields two different payloads.
pub fn encrypt(
    plaintext: &[u8],
    recipient: &PublicKey,
    ours: &EncryptionKeypair,
) -> Result<EncryptedPayload> {
    let cipher = box_cipher(recipient, ours)?;
    let nonce = Nonce::random();

    let ciphertext = cipher
        .encrypt(XNonce::from_slice(nonce.as_bytes()), plaintext)
        .map_err(|e| Error::EncryptionFailed(format!("Encryption failed: {}", e)))?;

    Ok(EncryptedPayload::new(&nonce, &ciphertext))
}

/// Decrypt a payload, separating malformed input from authentication failure
///
/// - `Err(InvalidEncoding)`: the payload could not be decoded; no
///   cryptography was attempted
/// - `Ok(None)`: authentication failed (wrong key or tampered data)
/// - `Ok(Some(plaintext))`: success
pub fn try_decrypt(
    payload: &EncryptedPayload,
    counterparty: &PublicKey,
    ours: &EncryptionKeypair,
) -> Result<Option<Vec<u8>>> {
    let (nonce, ciphertext) = payload.decode()?;
    let cipher = box_cipher(counterparty, ours)?;

    Ok(cipher
        .decrypt(XNonce::from_slice(nonce.as_bytes()), ciphertext.as_slice())
        .ok())
}

/// Decrypt a payload produced by [`encrypt`]
///
/// `counterparty` is the *other* side's public key at encryption time, or
/// our own for self-encrypted copies. Returns `None` on any failure.
pub fn decrypt(
    payload: &EncryptedPayload,
    counterparty: &PublicKey,
    ours: &EncryptionKeypair,
) -> Option<Vec<u8>> {
    try_decrypt(payload, counterparty, ours).ok().flatten()
}

/// Encrypt a UTF-8 message
pub fn encrypt_text(
    plaintext: &str,
    recipient: &PublicKey,
    ours: &EncryptionKeypair,
) -> Result<EncryptedPayload> {
    encrypt(plaintext.as_bytes(), recipient, ours)
}

/// Decrypt a UTF-8 message; invalid UTF-8 counts as a failed decryption
pub fn decrypt_text(
    payload: &EncryptedPayload,
    counterparty: &PublicKey,
    ours: &EncryptionKeypair,
) -> Option<String> {
    decrypt(payload, counterparty, ours).and_then(|bytes| String::from_utf8(bytes).ok())
}

// ============================================================================
// TESTS
// ============================================================================

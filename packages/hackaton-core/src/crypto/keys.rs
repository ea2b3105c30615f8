//! # Key Management
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          KEY TYPES                                      │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  EncryptionKeypair (X25519)                                     │   │
//! │  │  ─────────────────────────────                                   │   │
//! │  │                                                                  │   │
//! │  │  • Secret key: 32 bytes, memory only, zeroized on drop         │   │
//! │  │    Never serialized, transmitted, logged or Debug-printed.      │   │
//! │  │  • Public key: 32 bytes, published to the key directory        │   │
//! │  │                                                                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  PublicKey                                                      │   │
//! │  │  ─────────                                                       │   │
//! │  │                                                                  │   │
//! │  │  32 raw bytes, crosses every boundary as standard base64.       │   │
//! │  │  Anything that does not decode to exactly 32 bytes is           │   │
//! │  │  rejected with `InvalidEncoding`.                               │   │
//! │  │                                                                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::kdf::compute_key_fingerprint;
use super::PUBLIC_KEY_SIZE;
use crate::error::{Error, Result};

/// X25519 keypair used for chat encryption
///
/// ## Security
///
/// - The secret half is zeroized when this struct is dropped
/// - Not `Clone`: share it behind an `Arc` for the lifetime of a session
/// - `Debug` output redacts the secret
#[derive(ZeroizeOnDrop)]
pub struct EncryptionKeypair {
    /// Private encryption key (secret)
    #[zeroize(skip)] // x25519_dalek handles its own zeroization
    secret: StaticSecret,
    /// Public encryption key (derived from secret)
    #[zeroize(skip)]
    public: PublicKey,
}

impl EncryptionKeypair {
    /// Generate a new random keypair
    ///
    /// Not reproducible. Chat keys come from [`crate::wallet::derive_keypair`];
    /// this is for peers in tests and demos.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey(X25519PublicKey::from(&secret).to_bytes());
        Self { secret, public }
    }

    /// Create a keypair using `seed` directly as the secret key
    ///
    /// Deterministic: the same seed always produces the same keypair.
    pub fn from_seed(mut seed: [u8; 32]) -> Self {
        let secret = StaticSecret::from(seed);
        seed.zeroize();
        let public = PublicKey(X25519PublicKey::from(&secret).to_bytes());
        Self { secret, public }
    }

    /// Get the public key
    pub fn public_key(&self) -> PublicKey {
        self.public
    }

    /// Perform Diffie-Hellman key agreement
    ///
    /// - Alice: alice_secret × bob_public
    /// - Bob: bob_secret × alice_public
    ///
    /// Both computations produce the same output. With `their_public` set to
    /// our own public key the result is the self-encryption secret.
    pub(crate) fn diffie_hellman(&self, their_public: &PublicKey) -> Zeroizing<[u8; 32]> {
        let their_public = X25519PublicKey::from(their_public.0);
        Zeroizing::new(self.secret.diffie_hellman(&their_public).to_bytes())
    }

    #[cfg(test)]
    pub(crate) fn secret_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.secret.to_bytes())
    }
}

impl fmt::Debug for EncryptionKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKeypair")
            .field("public", &self.public)
            .field("secret", &"[redacted]")
            .finish()
    }
}

/// An X25519 public key, safe to publish
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    /// Encode as standard base64 (the directory / profile format)
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }

    /// Decode from standard base64
    ///
    /// Fails with `InvalidEncoding` unless the text decodes to exactly
    /// 32 bytes.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = BASE64.decode(encoded.trim())?;
        let len = bytes.len();
        let bytes: [u8; PUBLIC_KEY_SIZE] = bytes.try_into().map_err(|_| {
            Error::InvalidEncoding(format!(
                "public key must be {} bytes, got {}",
                PUBLIC_KEY_SIZE, len
            ))
        })?;
        Ok(Self(bytes))
    }

    /// Short hex fingerprint for out-of-band comparison
    pub fn fingerprint(&self) -> String {
        compute_key_fingerprint(&self.0)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_base64())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PublicKey::from_base64(&s).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// TESTS
// ============================================================================

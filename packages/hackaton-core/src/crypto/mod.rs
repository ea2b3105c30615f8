//! # Cryptography Module
//!
//! Primitives behind encrypted chat: the wallet-derived X25519 keypair and
//! the authenticated "box" used for every stored ciphertext.
//!
//! ## Key Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CRYPTOGRAPHIC ARCHITECTURE                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Wallet signature over SIGN_MESSAGE (65 bytes, never a transaction)    │
//! │                          │                                              │
//! │                          ▼                                              │
//! │  ┌─────────────────────────────────────────────────────────┐           │
//! │  │              Seed = SHA-256(signature)  (32 bytes)      │           │
//! │  └─────────────────────────────────────────────────────────┘           │
//! │                          │                                              │
//! │                          ▼                                              │
//! │  ┌─────────────────────────────────────────────────────────┐           │
//! │  │     X25519 secret key = seed, public key = seed · G     │           │
//! │  │     (secret: memory only │ public: published)           │           │
//! │  └─────────────────────────────────────────────────────────┘           │
//! │                          │                                              │
//! │                          ▼                                              │
//! │  ┌─────────────────────────────────────────────────────────┐           │
//! │  │  Box key = HKDF-SHA256(X25519(our_secret, their_public)) │           │
//! │  │  Ciphertext = XChaCha20-Poly1305(box key, 24-byte nonce) │           │
//! │  └─────────────────────────────────────────────────────────┘           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Algorithm Choices
//!
//! | Algorithm | Purpose |
//! |-----------|---------|
//! | SHA-256 | Signature → seed |
//! | X25519 | Key agreement (same curve family as NaCl box) |
//! | HKDF-SHA256 | DH output → AEAD key |
//! | XChaCha20-Poly1305 | Authenticated encryption, 24-byte random nonces |
//!
//! ## Security Considerations
//!
//! 1. **Key Zeroization**: secret keys and derived box keys are zeroized when dropped
//! 2. **Secure Random**: nonces come from `rand::rngs::OsRng`
//! 3. **No Nonce Reuse**: a fresh nonce for every encryption, never caller-supplied
//! 4. **Self-encryption**: `X25519(sk, pk_own)` is a valid agreement, so the
//!    sender can box a copy to themselves

mod encryption;
mod kdf;
mod keys;

pub use encryption::{
    decrypt, decrypt_text, encrypt, encrypt_text, try_decrypt, EncryptedPayload, Nonce,
    NONCE_SIZE, TAG_SIZE,
};
pub use kdf::{compute_key_fingerprint, derive_box_key, seed_from_signature};
pub use keys::{EncryptionKeypair, PublicKey};

/// Size of X25519 public keys in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of X25519 secret keys in bytes
pub const SECRET_KEY_SIZE: usize = 32;

//! # Key Derivation from a Wallet
//!
//! The chat keypair is never stored. It is re-derived on every "unlock" by
//! asking the wallet to sign one constant message:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        UNLOCK FLOW                                      │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  WalletSigner::sign_message(SIGN_MESSAGE)   (user may decline)         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  "0x…" hex signature ──parse_signature──► signature bytes              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  SHA-256(signature bytes) = seed ──► X25519 EncryptionKeypair          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The wallet's own private key never leaves the wallet. A wallet that signs
//! deterministically (RFC 6979 ECDSA) reproduces the same chat key on every
//! device, across sessions.

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::crypto::{seed_from_signature, EncryptionKeypair};
use crate::error::{Error, Result};

/// The one message every wallet signs to derive its chat key
///
/// Must never change: a different message means a different keypair and
/// unreadable history.
pub const SIGN_MESSAGE: &str = "HackaTon Encryption Key v1\n\n\
Signing this message derives your local encryption keypair.\n\
It does not authorize any transaction or share your private key.";

/// A wallet that can sign a personal message
///
/// Implemented by the app shell (browser wallet, WalletConnect, …).
/// Signing is user-interactive and may take arbitrarily long; dropping the
/// returned future abandons the request without side effects.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Sign `message`, returning the signature as hex (`0x` prefix optional)
    ///
    /// Implementations return [`Error::SigningRejected`] when the user
    /// declines or the wallet errors.
    async fn sign_message(&self, message: &str) -> Result<String>;
}

/// Decode a hex signature as returned by wallets
///
/// The signature is as sensitive as the chat secret key, so the decoded
/// bytes are wiped when dropped.
pub fn parse_signature(signature_hex: &str) -> Result<Zeroizing<Vec<u8>>> {
    let trimmed = signature_hex.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.is_empty() {
        return Err(Error::InvalidSignatureFormat("signature is empty".into()));
    }

    Ok(Zeroizing::new(hex::decode(digits)?))
}

/// Derive the chat keypair from raw signature bytes
///
/// Pure: the same bytes always give the same keypair.
pub fn derive_keypair(signature: &[u8]) -> Result<EncryptionKeypair> {
    if signature.is_empty() {
        return Err(Error::InvalidSignatureFormat("signature is empty".into()));
    }

    let seed = seed_from_signature(signature);
    Ok(EncryptionKeypair::from_seed(*seed))
}

/// Derive the chat keypair from a hex signature
pub fn derive_keypair_from_hex(signature_hex: &str) -> Result<EncryptionKeypair> {
    derive_keypair(&parse_signature(signature_hex)?)
}

/// Ask the wallet to sign [`SIGN_MESSAGE`] and derive the chat keypair
///
/// Any signer failure, declined or otherwise, is reported as
/// [`Error::SigningRejected`]. There is no retry.
pub async fn unlock(signer: &dyn WalletSigner) -> Result<EncryptionKeypair> {
    let signature = signer
        .sign_message(SIGN_MESSAGE)
        .await
        .map(Zeroizing::new)
        .map_err(|e| match e {
            Error::SigningRejected(_) => e,
            other => Error::SigningRejected(other.to_string()),
        })?;

    derive_keypair_from_hex(&signature)
}

// ============================================================================
// TESTS
// ============================================================================

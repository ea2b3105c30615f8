//! # HackaTon Chat Core
//!
//! End-to-end encrypted messaging between the two wallets of an accepted
//! intro, with no server-side key custody.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          APP SHELL (web / desktop)                      │
//! │      wallet connection · intro UI · chat bubbles · persistence          │
//! └───────────────┬──────────────────────────────────────┬──────────────────┘
//!                 │ WalletSigner                          │ PublicKeyDirectory
//!                 │                                       │ ConversationStore
//! ┌───────────────▼──────────────────────────────────────▼──────────────────┐
//! │                           HACKATON CORE                                 │
//! │                                                                         │
//! │  ┌──────────────┐    ┌──────────────┐    ┌─────────────────────────┐   │
//! │  │    wallet    │───►│   session    │───►│  messaging              │   │
//! │  │ sign → seed  │    │ keypair held │    │  SecureChannel          │   │
//! │  │ → keypair    │    │ in memory    │    │  seal / open / decrypt  │   │
//! │  └──────────────┘    └──────────────┘    └────────────┬────────────┘   │
//! │                                                       │                 │
//! │  ┌──────────────────────────────────────────────────▼──────────────┐   │
//! │  │  crypto: X25519 · HKDF-SHA256 · XChaCha20-Poly1305 · base64    │   │
//! │  └────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌────────────────────────────────────────────────────────────────┐   │
//! │  │  storage: MemoryStore · Database (SQLite, native only)         │   │
//! │  └────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`crypto`] - Key agreement, message boxes, key derivation
//! - [`wallet`] - Deriving the chat keypair from a wallet signature
//! - [`identity`] - Normalized wallet identities
//! - [`messaging`] - Stored / decrypted messages and secure channels
//! - [`session`] - The unlocked session holding the keypair
//! - [`storage`] - Key directory and conversation store
//! - [`config`] - Session configuration
//!
//! ## Security Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         SECURITY MODEL                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Never stored anywhere:                                                │
//! │  • The chat secret key (re-derived on every unlock)                   │
//! │  • Message plaintext                                                   │
//! │                                                                         │
//! │  Stored by collaborators (public or sealed):                           │
//! │  • One public key per wallet                                           │
//! │  • Two ciphertexts per message (recipient copy, sender copy)          │
//! │  • Routing metadata: sender, recipient, timestamp                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use hackaton_core::{ChatSession, ConversationId, MemoryStore, WalletIdentity};
//!
//! let store = Arc::new(MemoryStore::new());
//! let me = WalletIdentity::parse("0xA11CE...")?;
//! let session = ChatSession::new(me, store.clone(), store.clone());
//!
//! session.unlock(&my_wallet).await?;
//!
//! let channel = session.channel(peer, ConversationId::for_intro(&intro_id)?)?;
//! channel.send_message("gm")?;
//! for message in channel.decrypt_conversation()? {
//!     println!("{}", message.body.display_text());
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod config;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod messaging;
pub mod session;
pub mod storage;
/// Platform-aware time utilities for native and WASM targets.
pub mod time;
pub mod wallet;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use config::CoreConfig;
pub use crypto::{EncryptedPayload, EncryptionKeypair, PublicKey};
pub use error::{Error, ErrorReport, Result};
pub use identity::WalletIdentity;
pub use messaging::{
    ChannelState, ConversationId, DecryptedMessage, IntroParticipants, MessageBody,
    SecureChannel, StoredMessage,
};
pub use session::ChatSession;
#[cfg(not(target_arch = "wasm32"))]
pub use storage::Database;
pub use storage::{ConversationStore, MemoryStore, PublicKeyDirectory};
pub use wallet::{WalletSigner, SIGN_MESSAGE};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of the chat core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

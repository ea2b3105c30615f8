//! # Storage Module
//!
//! The two collaborators the chat core persists through, and the stores
//! that implement them.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         STORAGE SYSTEM                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  PublicKeyDirectory                                             │   │
//! │  │  wallet ──► published X25519 public key (last write wins)      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  ConversationStore                                              │   │
//! │  │  conversation ──► sealed messages in arrival order             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  Implementations:                                                      │
//! │  • MemoryStore - process memory (tests, demos, web shell cache)       │
//! │  • Database    - SQLite file or in-memory (native only)               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both collaborators are trusted for availability only: they see public
//! keys and ciphertext, never plaintext or secret keys. Wallet lookups are
//! case-insensitive because [`WalletIdentity`] is already normalized.

#[cfg(not(target_arch = "wasm32"))]
mod database;
mod memory;
#[cfg(not(target_arch = "wasm32"))]
mod schema;

#[cfg(not(target_arch = "wasm32"))]
pub use database::Database;
pub use memory::MemoryStore;

use crate::crypto::PublicKey;
use crate::error::Result;
use crate::identity::WalletIdentity;
use crate::messaging::{ConversationId, StoredMessage};

/// Maps wallets to their published chat public keys
pub trait PublicKeyDirectory: Send + Sync {
    /// Look up a wallet's current key; `Ok(None)` if never published
    fn get(&self, wallet: &WalletIdentity) -> Result<Option<PublicKey>>;

    /// Publish (or replace) a wallet's key
    fn put(&self, wallet: &WalletIdentity, key: &PublicKey) -> Result<()>;
}

/// Append-only log of sealed messages, per conversation
pub trait ConversationStore: Send + Sync {
    /// Append a message
    ///
    /// Ids are unique per conversation: appending an id already present in
    /// the same conversation is a no-op, while the same id in another
    /// conversation is stored there independently.
    fn append(&self, message: &StoredMessage) -> Result<()>;

    /// Every message of a conversation, oldest first
    fn list_all(&self, conversation: &ConversationId) -> Result<Vec<StoredMessage>>;
}

//! In-memory store.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::{ConversationStore, PublicKeyDirectory};
use crate::crypto::PublicKey;
use crate::error::Result;
use crate::identity::WalletIdentity;
use crate::messaging::{ConversationId, StoredMessage};

/// Key directory and conversation store held in process memory
///
/// Contents are lost when dropped. Safe to share across threads.
#[derive(Debug, Default)]
pub struct MemoryStore {
    keys: RwLock<HashMap<WalletIdentity, PublicKey>>,
    conversations: RwLock<HashMap<ConversationId, Vec<StoredMessage>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages stored for a conversation
    pub fn message_count(&self, conversation: &ConversationId) -> usize {
        self.conversations
            .read()
            .get(conversation)
            .map_or(0, Vec::len)
    }
}

impl PublicKeyDirectory for MemoryStore {
    fn get(&self, wallet: &WalletIdentity) -> Result<Option<PublicKey>> {
        Ok(self.keys.read().get(wallet).copied())
    }

    fn put(&self, wallet: &WalletIdentity, key: &PublicKey) -> Result<()> {
        self.keys.write().insert(wallet.clone(), *key);
        Ok(())
    }
}

impl ConversationStore for MemoryStore {
    fn append(&self, message: &StoredMessage) -> Result<()> {
        let mut conversations = self.conversations.write();
        let messages = conversations
            .entry(message.conversation_id.clone())
            .or_default();

        if messages.iter().any(|m| m.id == message.id) {
            tracing::debug!("Message {} already stored, skipping", message.id);
            return Ok(());
        }

        messages.push(message.clone());
        Ok(())
    }

    fn list_all(&self, conversation: &ConversationId) -> Result<Vec<StoredMessage>> {
        Ok(self
            .conversations
            .read()
            .get(conversation)
            .cloned()
            .unwrap_or_default())
    }
}

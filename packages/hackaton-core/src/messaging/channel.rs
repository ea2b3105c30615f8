//! # Secure Channel
//!
//! One conversation as seen from one unlocked (or locked) session.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        CHANNEL STATES                                   │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌──────────┐   unlock    ┌──────────────────────────────────────────┐ │
//! │  │  Locked  │────────────►│  Unlocked                                │ │
//! │  │          │◄────────────│                                          │ │
//! │  └──────────┘    lock     │  ┌────────────────┐  peer publishes     │ │
//! │                           │  │ PeerKeyMissing │──────────────┐      │ │
//! │                           │  └────────────────┘              ▼      │ │
//! │                           │                    ┌──────────────────┐ │ │
//! │                           │                    │ PeerKeyAvailable │ │ │
//! │                           │                    └──────────────────┘ │ │
//! │                           └──────────────────────────────────────────┘ │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The peer key is read from the directory before every send and every
//! decrypt pass, so a peer unlocking mid-session is picked up on the next
//! refresh without any notification.

use crate::crypto::PublicKey;
use crate::error::{Error, Result};
use crate::identity::WalletIdentity;
use crate::session::ChatSession;

use super::envelope::{decrypt_conversation, seal_message};
use super::{validate_draft, ConversationId, DecryptedMessage, MessageBody, StoredMessage};

/// Where a conversation stands for the local session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// No keypair in this session
    Locked,
    /// Unlocked, but the peer has not published a key
    PeerKeyMissing,
    /// Unlocked and the peer's current key is known
    PeerKeyAvailable(PublicKey),
}

impl ChannelState {
    /// Whether sending is possible in this state
    pub fn can_send(&self) -> bool {
        matches!(self, Self::PeerKeyAvailable(_))
    }
}

/// A conversation with one peer, bound to a [`ChatSession`]
pub struct SecureChannel<'a> {
    session: &'a ChatSession,
    peer: WalletIdentity,
    conversation_id: ConversationId,
}

impl<'a> SecureChannel<'a> {
    pub(crate) fn new(
        session: &'a ChatSession,
        peer: WalletIdentity,
        conversation_id: ConversationId,
    ) -> Self {
        Self {
            session,
            peer,
            conversation_id,
        }
    }

    /// The other participant
    pub fn peer(&self) -> &WalletIdentity {
        &self.peer
    }

    /// The conversation this channel reads and writes
    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    /// Current state, re-reading the peer key from the directory
    pub fn state(&self) -> Result<ChannelState> {
        if !self.session.is_unlocked() {
            return Ok(ChannelState::Locked);
        }

        Ok(match self.session.directory().get(&self.peer)? {
            Some(key) => ChannelState::PeerKeyAvailable(key),
            None => ChannelState::PeerKeyMissing,
        })
    }

    /// Encrypt and send a message
    ///
    /// The draft is trimmed first. The record is sealed for the peer and for
    /// ourselves, then appended to the conversation store. A failed append
    /// is logged and not surfaced; the plaintext message is returned for
    /// immediate display either way.
    pub fn send_message(&self, draft: &str) -> Result<DecryptedMessage> {
        let keypair = self.session.keypair().ok_or(Error::Locked)?;
        let text = validate_draft(draft, self.session.config().max_message_size)?;

        let peer_key = self
            .session
            .directory()
            .get(&self.peer)?
            .ok_or_else(|| Error::PeerKeyUnavailable(self.peer.short()))?;

        let body = seal_message(text, &peer_key, &keypair)?;
        let message = StoredMessage::new(
            self.conversation_id.clone(),
            self.session.wallet(),
            &self.peer,
            body,
        );

        match self.session.store().append(&message) {
            Ok(()) => tracing::debug!(
                "Sent message {} to {} in {}",
                message.id,
                self.peer.short(),
                self.conversation_id
            ),
            Err(e) => tracing::warn!("Failed to store message {}: {}", message.id, e),
        }

        Ok(DecryptedMessage {
            id: message.id,
            conversation_id: message.conversation_id,
            from_wallet: message.from_wallet,
            to_wallet: message.to_wallet,
            timestamp: message.timestamp,
            mine: true,
            body: MessageBody::Decrypted(text.to_string()),
        })
    }

    /// Load and decrypt the whole conversation
    ///
    /// Safe to call repeatedly; each call re-reads the peer key and the
    /// stored messages. Unreadable messages are reported per message.
    pub fn decrypt_conversation(&self) -> Result<Vec<DecryptedMessage>> {
        let keypair = self.session.keypair().ok_or(Error::Locked)?;
        let peer_key = self.session.directory().get(&self.peer)?;
        let stored = self.session.store().list_all(&self.conversation_id)?;

        let messages = decrypt_conversation(&stored, self.session.wallet(), &keypair, peer_key.as_ref());

        if self.session.config().verbose_logging {
            tracing::info!(
                "Conversation {} with {}: {} messages, peer key {}",
                self.conversation_id,
                self.peer.short(),
                messages.len(),
                peer_key.map_or_else(|| "missing".to_string(), |k| k.fingerprint())
            );
        }

        Ok(messages)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::fixtures::{intro_id, session, signature_for, FailingStore};
    use crate::storage::{ConversationStore, MemoryStore, PublicKeyDirectory};
    use std::sync::Arc;

    #[test]
    fn test_locked_channel() {
        let store = Arc::new(MemoryStore::new());
        let alice = session("0xA11CE", &store);
        let channel = alice.channel(WalletIdentity::parse("0xB0B").unwrap(), intro_id()).unwrap();

        assert_eq!(channel.state().unwrap(), ChannelState::Locked);
        assert!(!channel.state().unwrap().can_send());
        assert!(matches!(channel.send_message("gm"), Err(Error::Locked)));
        assert!(matches!(channel.decrypt_conversation(), Err(Error::Locked)));
    }

    #[test]
    fn test_peer_key_missing_blocks_send() {
        let store = Arc::new(MemoryStore::new());
        let alice = session("0xA11CE", &store);
        alice.unlock_with_signature(&signature_for(0xAA)).unwrap();

        let channel = alice.channel(WalletIdentity::parse("0xB0B").unwrap(), intro_id()).unwrap();
        assert_eq!(channel.state().unwrap(), ChannelState::PeerKeyMissing);

        let err = channel.send_message("gm").unwrap_err();
        assert!(matches!(err, Error::PeerKeyUnavailable(_)));
        assert!(err.is_recoverable());
        assert_eq!(store.message_count(&intro_id()), 0);
    }

    #[test]
    fn test_draft_validation() {
        let store = Arc::new(MemoryStore::new());
        let alice = session("0xA11CE", &store);
        let bob = session("0xB0B", &store);
        alice.unlock_with_signature(&signature_for(0xAA)).unwrap();
        bob.unlock_with_signature(&signature_for(0xBB)).unwrap();

        let channel = alice.channel(bob.wallet().clone(), intro_id()).unwrap();

        assert!(matches!(channel.send_message("   "), Err(Error::InvalidMessageContent(_))));

        let sent = channel.send_message("  gm  ").unwrap();
        assert_eq!(sent.body, MessageBody::Decrypted("gm".into()));
        assert!(sent.mine);
    }

    #[test]
    fn test_state_follows_directory() {
        let store = Arc::new(MemoryStore::new());
        let alice = session("0xA11CE", &store);
        alice.unlock_with_signature(&signature_for(0xAA)).unwrap();

        let bob = WalletIdentity::parse("0xB0B").unwrap();
        let channel = alice.channel(bob.clone(), intro_id()).unwrap();
        assert_eq!(channel.state().unwrap(), ChannelState::PeerKeyMissing);

        let bob_key = crate::wallet::derive_keypair(&[0xBB; 65]).unwrap().public_key();
        store.put(&bob, &bob_key).unwrap();

        assert_eq!(channel.state().unwrap(), ChannelState::PeerKeyAvailable(bob_key));
        assert!(channel.state().unwrap().can_send());
    }

    #[test]
    fn test_store_failure_is_not_surfaced() {
        let keys = Arc::new(MemoryStore::new());
        let failing = Arc::new(FailingStore);

        let alice = ChatSession::new(
            WalletIdentity::parse("0xA11CE").unwrap(),
            keys.clone(),
            failing.clone(),
        );
        alice.unlock_with_signature(&signature_for(0xAA)).unwrap();

        let bob = WalletIdentity::parse("0xB0B").unwrap();
        keys.put(&bob, &crate::wallet::derive_keypair(&[0xBB; 65]).unwrap().public_key())
            .unwrap();

        let channel = alice.channel(bob, intro_id()).unwrap();
        let sent = channel.send_message("gm").unwrap();
        assert_eq!(sent.body.as_text(), Some("gm"));

        // Reads still fail loudly
        assert!(matches!(
            failing.list_all(&intro_id()),
            Err(Error::StorageReadError(_))
        ));
        assert!(matches!(channel.decrypt_conversation(), Err(Error::StorageReadError(_))));
    }
}

//! # Messaging Module
//!
//! Dual-encrypted chat messages between the two sides of an intro.
//!
//! ## Message Encryption Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      MESSAGE ENCRYPTION                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Sender (Alice)             Input: "gm"                                │
//! │  ─────────────────────────────────────────────────────────────         │
//! │                                                                         │
//! │  1. Copy for the recipient                                             │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │  box(alice_secret × bob_public, random_24_byte_nonce)      │       │
//! │  │  → forRecipient { ct, nonce }                              │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │                                                                         │
//! │  2. Copy for ourselves                                                 │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │  box(alice_secret × alice_public, fresh nonce)             │       │
//! │  │  → forSender { ct, nonce }                                 │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │                                                                         │
//! │  Output: StoredMessage (metadata in the clear, body sealed twice)     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Message Decryption Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      MESSAGE DECRYPTION                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Viewer sent it?  ──yes──► open forSender with our own public key     │
//! │        │                                                                │
//! │        no                                                               │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  Peer key known?  ──no───► AwaitingPeerKey                             │
//! │        │                                                                │
//! │        yes                                                              │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  open forRecipient with the peer's key                                 │
//! │        ├── ok ─────────► Decrypted(text)                               │
//! │        └── fail ───────► DecryptionFailed                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sealed bodies never leave this module unencrypted; only
//! [`DecryptedMessage`] carries plaintext, and only in memory.

mod channel;
mod envelope;

pub use channel::{ChannelState, SecureChannel};
pub use envelope::{decrypt_conversation, open_message, seal_message, SealedBody};

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::crypto::EncryptedPayload;
use crate::error::{Error, Result};
use crate::identity::WalletIdentity;

/// Maximum message content size (64KB)
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Shown in place of a message that cannot be read until the peer unlocks
pub const AWAITING_PEER_KEY_TEXT: &str =
    "[🔒 encrypted — other party needs to unlock chat to share their key]";

/// Shown in place of a message whose ciphertext did not authenticate
pub const DECRYPTION_FAILED_TEXT: &str = "[⚠️ decryption failed]";

// ============================================================================
// CONVERSATIONS
// ============================================================================

/// Identifies one conversation (one accepted intro)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConversationId(String);

impl ConversationId {
    /// Use an intro's id as the conversation id
    pub fn for_intro(intro_id: &str) -> Result<Self> {
        let trimmed = intro_id.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidIdentity("conversation id is empty".into()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Generate a deterministic conversation id from two wallets
    ///
    /// Both parties derive the same id regardless of argument order.
    pub fn between(a: &WalletIdentity, b: &WalletIdentity) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };

        let mut hasher = Sha256::new();
        hasher.update(first.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(second.as_str().as_bytes());

        let hash = hasher.finalize();
        Self(hex::encode(&hash[..16]))
    }

    /// The id as text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ConversationId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::for_intro(&value)
    }
}

impl From<ConversationId> for String {
    fn from(id: ConversationId) -> Self {
        id.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two wallets on an accepted intro
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntroParticipants {
    /// Wallet that applied
    pub applicant: WalletIdentity,
    /// Wallet that owns the listing
    pub owner: WalletIdentity,
}

impl IntroParticipants {
    /// Create from the two wallets
    pub fn new(applicant: WalletIdentity, owner: WalletIdentity) -> Self {
        Self { applicant, owner }
    }

    /// Whether `wallet` is either side of the intro
    pub fn contains(&self, wallet: &WalletIdentity) -> bool {
        &self.applicant == wallet || &self.owner == wallet
    }

    /// The other side of the intro, from `wallet`'s point of view
    pub fn counterparty_of(&self, wallet: &WalletIdentity) -> Result<&WalletIdentity> {
        if wallet == &self.applicant {
            Ok(&self.owner)
        } else if wallet == &self.owner {
            Ok(&self.applicant)
        } else {
            Err(Error::NotAParticipant(wallet.short()))
        }
    }
}

// ============================================================================
// STORED MESSAGES
// ============================================================================

/// A message as persisted by the conversation store
///
/// Routing metadata (sender, recipient, timestamp) is in the clear. The body
/// exists only as two sealed copies. Field names match the records the web
/// app keeps, and `introId` is accepted for the conversation id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    /// Unique message ID (UUID)
    pub id: String,
    /// Conversation this belongs to
    #[serde(alias = "introId")]
    pub conversation_id: ConversationId,
    /// Sender's wallet, as written by the sender
    pub from_wallet: String,
    /// Recipient's wallet, as written by the sender
    pub to_wallet: String,
    /// Body sealed for the recipient
    pub for_recipient: EncryptedPayload,
    /// Body sealed for the sender's own later reading
    pub for_sender: EncryptedPayload,
    /// Unix timestamp when sent (milliseconds)
    pub timestamp: i64,
}

impl StoredMessage {
    /// Create a new outgoing record stamped with a fresh id and the current time
    pub fn new(
        conversation_id: ConversationId,
        from: &WalletIdentity,
        to: &WalletIdentity,
        body: SealedBody,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            conversation_id,
            from_wallet: from.to_string(),
            to_wallet: to.to_string(),
            for_recipient: body.for_recipient,
            for_sender: body.for_sender,
            timestamp: crate::time::now_timestamp_millis(),
        }
    }

    /// Check if `wallet` sent this message (case-insensitive)
    pub fn is_from(&self, wallet: &WalletIdentity) -> bool {
        wallet.matches(&self.from_wallet)
    }
}

// ============================================================================
// DECRYPTED VIEW
// ============================================================================

/// What a viewer can make of one message body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "text", rename_all = "camelCase")]
pub enum MessageBody {
    /// The plaintext
    Decrypted(String),
    /// The peer has not published a key yet; retry after they unlock
    AwaitingPeerKey,
    /// The ciphertext did not authenticate or was malformed
    DecryptionFailed,
}

impl MessageBody {
    /// Get the plaintext if decryption succeeded
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Decrypted(text) => Some(text),
            _ => None,
        }
    }

    /// Whether this body may become readable later
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::AwaitingPeerKey)
    }

    /// Text for a chat bubble, with placeholders for unreadable bodies
    pub fn display_text(&self) -> &str {
        match self {
            Self::Decrypted(text) => text,
            Self::AwaitingPeerKey => AWAITING_PEER_KEY_TEXT,
            Self::DecryptionFailed => DECRYPTION_FAILED_TEXT,
        }
    }
}

/// A message as shown to one viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptedMessage {
    /// Message ID
    pub id: String,
    /// Conversation this belongs to
    pub conversation_id: ConversationId,
    /// Sender's wallet
    pub from_wallet: String,
    /// Recipient's wallet
    pub to_wallet: String,
    /// Unix timestamp when sent (milliseconds)
    pub timestamp: i64,
    /// Whether the viewer sent it
    pub mine: bool,
    /// The body, or why it is unreadable
    pub body: MessageBody,
}

/// Trim a draft and check it against the size limit
///
/// Returns the text that will actually be sent.
pub fn validate_draft(draft: &str, max_size: usize) -> Result<&str> {
    let text = draft.trim();
    if text.is_empty() {
        return Err(Error::InvalidMessageContent("message is empty".into()));
    }
    if text.len() > max_size {
        return Err(Error::MessageTooLarge {
            size: text.len(),
            max: max_size,
        });
    }
    Ok(text)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{encrypt_text, EncryptionKeypair};

    fn wallet(s: &str) -> WalletIdentity {
        WalletIdentity::parse(s).unwrap()
    }

    #[test]
    fn test_conversation_id_generation() {
        let alice = wallet("0xA11CE");
        let bob = wallet("0xB0B");

        let id1 = ConversationId::between(&alice, &bob);
        let id2 = ConversationId::between(&bob, &alice);

        // Should be the same regardless of order
        assert_eq!(id1, id2);
        assert_eq!(id1.as_str().len(), 32);

        // Casing of the input never matters
        assert_eq!(id1, ConversationId::between(&wallet("0xa11ce"), &bob));

        // Different pairs should have different IDs
        let id3 = ConversationId::between(&alice, &wallet("0xC4A7"));
        assert_ne!(id1, id3);
    }

    #[test]
    fn test_conversation_id_for_intro() {
        assert_eq!(ConversationId::for_intro(" intro-42 ").unwrap().as_str(), "intro-42");
        assert!(ConversationId::for_intro("  ").is_err());
    }

    #[test]
    fn test_conversation_id_deserialize_normalizes() {
        let id: ConversationId = serde_json::from_str(r#"" intro-1 ""#).unwrap();
        assert_eq!(id, ConversationId::for_intro("intro-1").unwrap());
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""intro-1""#);

        assert!(serde_json::from_str::<ConversationId>(r#""   ""#).is_err());
    }

    #[test]
    fn test_counterparty() {
        let intro = IntroParticipants::new(wallet("0xA11CE"), wallet("0xB0B"));

        assert_eq!(intro.counterparty_of(&wallet("0xa11ce")).unwrap(), &wallet("0xb0b"));
        assert_eq!(intro.counterparty_of(&wallet("0xB0B")).unwrap(), &wallet("0xa11ce"));
        assert!(matches!(
            intro.counterparty_of(&wallet("0xC4A7")),
            Err(Error::NotAParticipant(_))
        ));
        assert!(!intro.contains(&wallet("0xC4A7")));
    }

    #[test]
    fn test_message_body() {
        let text = MessageBody::Decrypted("gm".into());
        assert_eq!(text.as_text(), Some("gm"));
        assert_eq!(text.display_text(), "gm");
        assert!(!text.is_pending());

        assert!(MessageBody::AwaitingPeerKey.is_pending());
        assert_eq!(MessageBody::AwaitingPeerKey.display_text(), AWAITING_PEER_KEY_TEXT);
        assert_eq!(MessageBody::DecryptionFailed.as_text(), None);
        assert_eq!(MessageBody::DecryptionFailed.display_text(), DECRYPTION_FAILED_TEXT);
    }

    #[test]
    fn test_message_body_serialization() {
        let json = serde_json::to_string(&MessageBody::Decrypted("gm".into())).unwrap();
        assert_eq!(json, r#"{"status":"decrypted","text":"gm"}"#);

        let json = serde_json::to_string(&MessageBody::AwaitingPeerKey).unwrap();
        assert_eq!(json, r#"{"status":"awaitingPeerKey"}"#);
    }

    #[test]
    fn test_validate_draft() {
        assert_eq!(validate_draft("  gm \n", MAX_MESSAGE_SIZE).unwrap(), "gm");
        assert!(matches!(
            validate_draft(" \t\n ", MAX_MESSAGE_SIZE),
            Err(Error::InvalidMessageContent(_))
        ));
        assert!(matches!(
            validate_draft("hello", 4),
            Err(Error::MessageTooLarge { size: 5, max: 4 })
        ));
    }

    #[test]
    fn test_stored_message_accepts_web_records() {
        let kp = EncryptionKeypair::generate();
        let payload = encrypt_text("gm", &kp.public_key(), &kp).unwrap();

        let json = serde_json::json!({
            "id": "m1",
            "introId": "intro-42",
            "fromWallet": "0xA11CE",
            "toWallet": "0xB0B",
            "forRecipient": payload,
            "forSender": payload,
            "timestamp": 1_700_000_000_000i64,
        });

        let message: StoredMessage = serde_json::from_value(json).unwrap();
        assert_eq!(message.conversation_id.as_str(), "intro-42");
        assert!(message.is_from(&wallet("0xa11ce")));
        assert!(!message.is_from(&wallet("0xb0b")));

        let out = serde_json::to_value(&message).unwrap();
        assert_eq!(out["conversationId"], "intro-42");
        assert_eq!(out["forRecipient"]["nonce"], payload.nonce.as_str());
    }
}

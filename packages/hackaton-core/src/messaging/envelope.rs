//! Sealing and opening message bodies.
//!
//! Pure functions over keys and records; no collaborator is touched here.

use crate::crypto::{encrypt_text, try_decrypt, EncryptedPayload, EncryptionKeypair, PublicKey};
use crate::error::Result;
use crate::identity::WalletIdentity;

use super::{DecryptedMessage, MessageBody, StoredMessage};

/// A message body sealed twice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBody {
    /// Readable by the recipient, using the sender's public key
    pub for_recipient: EncryptedPayload,
    /// Readable by the sender, using their own public key
    pub for_sender: EncryptedPayload,
}

/// Seal `plaintext` for the peer and for ourselves
///
/// Each copy gets its own random nonce.
pub fn seal_message(
    plaintext: &str,
    peer_key: &PublicKey,
    keypair: &EncryptionKeypair,
) -> Result<SealedBody> {
    let for_recipient = encrypt_text(plaintext, peer_key, keypair)?;
    let for_sender = encrypt_text(plaintext, &keypair.public_key(), keypair)?;

    Ok(SealedBody {
        for_recipient,
        for_sender,
    })
}

/// Open one stored message from `viewer`'s point of view
///
/// Never fails: unreadable bodies come back as
/// [`MessageBody::AwaitingPeerKey`] or [`MessageBody::DecryptionFailed`].
pub fn open_message(
    message: &StoredMessage,
    viewer: &WalletIdentity,
    keypair: &EncryptionKeypair,
    peer_key: Option<&PublicKey>,
) -> DecryptedMessage {
    let mine = message.is_from(viewer);

    let body = if mine {
        open_payload(&message.id, &message.for_sender, &keypair.public_key(), keypair)
    } else {
        match peer_key {
            Some(peer_key) => open_payload(&message.id, &message.for_recipient, peer_key, keypair),
            None => MessageBody::AwaitingPeerKey,
        }
    };

    DecryptedMessage {
        id: message.id.clone(),
        conversation_id: message.conversation_id.clone(),
        from_wallet: message.from_wallet.clone(),
        to_wallet: message.to_wallet.clone(),
        timestamp: message.timestamp,
        mine,
        body,
    }
}

fn open_payload(
    id: &str,
    payload: &EncryptedPayload,
    counterparty: &PublicKey,
    keypair: &EncryptionKeypair,
) -> MessageBody {
    match try_decrypt(payload, counterparty, keypair) {
        Ok(Some(bytes)) => match String::from_utf8(bytes) {
            Ok(text) => MessageBody::Decrypted(text),
            Err(_) => {
                tracing::debug!("Message {} decrypted to invalid UTF-8", id);
                MessageBody::DecryptionFailed
            }
        },
        Ok(None) => {
            tracing::debug!("Message {} failed authentication", id);
            MessageBody::DecryptionFailed
        }
        Err(e) => {
            tracing::debug!("Message {} is malformed: {}", id, e);
            MessageBody::DecryptionFailed
        }
    }
}

/// Open every message of a conversation, preserving order
///
/// `peer_key` is the counterparty's *current* published key, or `None`
/// when they have not unlocked yet. One bad record never affects another.
pub fn decrypt_conversation(
    messages: &[StoredMessage],
    viewer: &WalletIdentity,
    keypair: &EncryptionKeypair,
    peer_key: Option<&PublicKey>,
) -> Vec<DecryptedMessage> {
    let decrypted: Vec<DecryptedMessage> = messages
        .iter()
        .map(|message| open_message(message, viewer, keypair, peer_key))
        .collect();

    let failed = decrypted
        .iter()
        .filter(|m| m.body == MessageBody::DecryptionFailed)
        .count();
    let pending = decrypted.iter().filter(|m| m.body.is_pending()).count();

    tracing::debug!(
        "Decrypted {} messages for {} ({} awaiting peer key, {} failed)",
        decrypted.len(),
        viewer.short(),
        pending,
        failed
    );

    decrypted
}

// ============================================================================
// TESTS
// ============================================================================

//! # Chat Session
//!
//! Holds the wallet-derived keypair for as long as the user keeps chat
//! unlocked, and hands out [`SecureChannel`]s for individual conversations.
//!
//! ## Lifecycle
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SESSION LIFECYCLE                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  1. Create                                                             │
//! │     ChatSession::new(wallet, directory, store)      ──► Locked        │
//! │            │                                                            │
//! │            ▼                                                            │
//! │  2. Unlock (user signs SIGN_MESSAGE once)                              │
//! │     derive keypair ──► directory.put(wallet, public) ──► Unlocked     │
//! │            │                                                            │
//! │            ▼                                                            │
//! │  3. Chat                                                               │
//! │     session.channel(peer, conversation)                                │
//! │       ├── send_message()                                               │
//! │       └── decrypt_conversation()                                       │
//! │            │                                                            │
//! │            ▼                                                            │
//! │  4. Lock / drop                                                        │
//! │     keypair released and zeroized                   ──► Locked        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::CoreConfig;
use crate::crypto::{EncryptionKeypair, PublicKey};
use crate::error::{Error, Result};
use crate::identity::WalletIdentity;
use crate::messaging::{ConversationId, IntroParticipants, SecureChannel};
use crate::storage::{ConversationStore, PublicKeyDirectory};
use crate::wallet::{self, WalletSigner};

/// One user's chat session
///
/// The keypair lives only in memory, shared through an `Arc` with channels
/// that are mid-operation. It is zeroized once the last holder drops it.
pub struct ChatSession {
    wallet: WalletIdentity,
    directory: Arc<dyn PublicKeyDirectory>,
    store: Arc<dyn ConversationStore>,
    config: CoreConfig,
    keypair: RwLock<Option<Arc<EncryptionKeypair>>>,
}

impl ChatSession {
    /// Create a locked session with the default configuration
    pub fn new(
        wallet: WalletIdentity,
        directory: Arc<dyn PublicKeyDirectory>,
        store: Arc<dyn ConversationStore>,
    ) -> Self {
        Self {
            wallet,
            directory,
            store,
            config: CoreConfig::default(),
            keypair: RwLock::new(None),
        }
    }

    /// Create a locked session with a custom configuration
    pub fn with_config(
        wallet: WalletIdentity,
        directory: Arc<dyn PublicKeyDirectory>,
        store: Arc<dyn ConversationStore>,
        config: CoreConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(wallet, directory, store)
        })
    }

    /// The local wallet
    pub fn wallet(&self) -> &WalletIdentity {
        &self.wallet
    }

    /// The session configuration
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Whether a keypair is held
    pub fn is_unlocked(&self) -> bool {
        self.keypair.read().is_some()
    }

    /// Our published public key, if unlocked
    pub fn public_key(&self) -> Option<PublicKey> {
        self.keypair.read().as_ref().map(|kp| kp.public_key())
    }

    pub(crate) fn keypair(&self) -> Option<Arc<EncryptionKeypair>> {
        self.keypair.read().clone()
    }

    pub(crate) fn directory(&self) -> &dyn PublicKeyDirectory {
        self.directory.as_ref()
    }

    pub(crate) fn store(&self) -> &dyn ConversationStore {
        self.store.as_ref()
    }

    /// Unlock chat by asking the wallet to sign [`wallet::SIGN_MESSAGE`]
    ///
    /// Derives the keypair and publishes its public half. Already unlocked
    /// sessions return their key without prompting the wallet again. If the
    /// user declines, the session stays locked.
    pub async fn unlock(&self, signer: &dyn WalletSigner) -> Result<PublicKey> {
        if let Some(public) = self.public_key() {
            return Ok(public);
        }

        tracing::info!("Requesting unlock signature from {}", self.wallet.short());

        let keypair = match wallet::unlock(signer).await {
            Ok(keypair) => keypair,
            Err(e) => {
                tracing::warn!("Unlock failed for {}: {}", self.wallet.short(), e);
                return Err(e);
            }
        };

        self.install(keypair)
    }

    /// Unlock chat with a signature the shell already obtained
    pub fn unlock_with_signature(&self, signature_hex: &str) -> Result<PublicKey> {
        let keypair = wallet::derive_keypair_from_hex(signature_hex)?;
        self.install(keypair)
    }

    fn install(&self, keypair: EncryptionKeypair) -> Result<PublicKey> {
        let public = keypair.public_key();

        // Publish before holding the key, so a failed publish leaves us locked
        self.directory.put(&self.wallet, &public)?;
        *self.keypair.write() = Some(Arc::new(keypair));

        tracing::info!(
            "Chat unlocked for {} (key fingerprint {})",
            self.wallet.short(),
            public.fingerprint()
        );
        Ok(public)
    }

    /// Drop the keypair and return to Locked
    pub fn lock(&self) {
        if self.keypair.write().take().is_some() {
            tracing::info!("Chat locked for {}", self.wallet.short());
        }
    }

    /// Open a channel to `peer` for `conversation`
    pub fn channel(
        &self,
        peer: WalletIdentity,
        conversation: ConversationId,
    ) -> Result<SecureChannel<'_>> {
        if peer == self.wallet {
            return Err(Error::InvalidIdentity(
                "cannot open a conversation with yourself".into(),
            ));
        }
        Ok(SecureChannel::new(self, peer, conversation))
    }

    /// Open the channel for an accepted intro, resolving the counterparty
    pub fn intro_channel(
        &self,
        conversation: ConversationId,
        participants: &IntroParticipants,
    ) -> Result<SecureChannel<'_>> {
        let peer = participants.counterparty_of(&self.wallet)?.clone();
        self.channel(peer, conversation)
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::messaging::StoredMessage;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;

    /// 65-byte hex signature of one repeated byte
    pub fn signature_for(byte: u8) -> String {
        format!("0x{}", hex::encode([byte; 65]))
    }

    pub fn intro_id() -> ConversationId {
        ConversationId::for_intro("intro-1").unwrap()
    }

    pub fn session(address: &str, store: &Arc<MemoryStore>) -> ChatSession {
        ChatSession::new(
            WalletIdentity::parse(address).unwrap(),
            store.clone(),
            store.clone(),
        )
    }

    /// Signs with a fixed signature and counts prompts
    pub struct FixedSigner {
        pub signature: String,
        pub prompts: std::sync::atomic::AtomicUsize,
    }

    impl FixedSigner {
        pub fn new(byte: u8) -> Self {
            Self {
                signature: signature_for(byte),
                prompts: Default::default(),
            }
        }
    }

    #[async_trait]
    impl WalletSigner for FixedSigner {
        async fn sign_message(&self, _message: &str) -> Result<String> {
            self.prompts
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(self.signature.clone())
        }
    }

    pub struct DecliningSigner;

    #[async_trait]
    impl WalletSigner for DecliningSigner {
        async fn sign_message(&self, _message: &str) -> Result<String> {
            Err(Error::SigningRejected("User rejected the request.".into()))
        }
    }

    /// A wallet whose connection is gone
    pub struct OfflineSigner;

    #[async_trait]
    impl WalletSigner for OfflineSigner {
        async fn sign_message(&self, _message: &str) -> Result<String> {
            Err(Error::StorageReadError("wallet transport dropped".into()))
        }
    }

    /// A store that is always down
    pub struct FailingStore;

    impl ConversationStore for FailingStore {
        fn append(&self, _message: &StoredMessage) -> Result<()> {
            Err(Error::StorageWriteError("quota exceeded".into()))
        }

        fn list_all(&self, _conversation: &ConversationId) -> Result<Vec<StoredMessage>> {
            Err(Error::StorageReadError("unavailable".into()))
        }
    }

    impl PublicKeyDirectory for FailingStore {
        fn get(&self, _wallet: &WalletIdentity) -> Result<Option<PublicKey>> {
            Err(Error::StorageReadError("unavailable".into()))
        }

        fn put(&self, _wallet: &WalletIdentity, _key: &PublicKey) -> Result<()> {
            Err(Error::StorageWriteError("unavailable".into()))
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::messaging::MessageBody;
    use crate::storage::MemoryStore;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_unlock_publishes_key() {
        let store = Arc::new(MemoryStore::new());
        let alice = session("0xA11CE", &store);
        assert!(!alice.is_unlocked());

        let signer = FixedSigner::new(0xAA);
        let public = alice.unlock(&signer).await.unwrap();

        assert!(alice.is_unlocked());
        assert_eq!(alice.public_key(), Some(public));
        assert_eq!(store.get(alice.wallet()).unwrap(), Some(public));
    }

    #[tokio::test]
    async fn test_unlock_twice_prompts_once() {
        let store = Arc::new(MemoryStore::new());
        let alice = session("0xA11CE", &store);
        let signer = FixedSigner::new(0xAA);

        let first = alice.unlock(&signer).await.unwrap();
        let second = alice.unlock(&signer).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(signer.prompts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_declined_unlock_stays_locked() {
        let store = Arc::new(MemoryStore::new());
        let alice = session("0xA11CE", &store);

        let err = alice.unlock(&DecliningSigner).await.unwrap_err();

        assert!(matches!(err, Error::SigningRejected(_)));
        assert!(err.requires_user_action());
        assert!(!alice.is_unlocked());
        assert_eq!(store.get(alice.wallet()).unwrap(), None);
    }

    #[tokio::test]
    async fn test_wallet_error_unlock_stays_locked() {
        let store = Arc::new(MemoryStore::new());
        let alice = session("0xA11CE", &store);

        let err = alice.unlock(&OfflineSigner).await.unwrap_err();

        assert!(matches!(err, Error::SigningRejected(_)));
        assert!(!alice.is_unlocked());
        assert_eq!(store.get(alice.wallet()).unwrap(), None);
    }

    #[test]
    fn test_failed_publish_stays_locked() {
        let alice = ChatSession::new(
            WalletIdentity::parse("0xA11CE").unwrap(),
            Arc::new(FailingStore),
            Arc::new(MemoryStore::new()),
        );

        let result = alice.unlock_with_signature(&signature_for(0xAA));

        assert!(matches!(result, Err(Error::StorageWriteError(_))));
        assert!(!alice.is_unlocked());
    }

    #[test]
    fn test_lock_releases_keypair() {
        let store = Arc::new(MemoryStore::new());
        let alice = session("0xA11CE", &store);
        alice.unlock_with_signature(&signature_for(0xAA)).unwrap();

        alice.lock();

        assert!(!alice.is_unlocked());
        assert_eq!(alice.public_key(), None);
        // The published key stays in the directory
        assert!(store.get(alice.wallet()).unwrap().is_some());
    }

    #[test]
    fn test_unlock_is_deterministic_across_sessions() {
        let store = Arc::new(MemoryStore::new());

        let first = session("0xA11CE", &store)
            .unlock_with_signature(&signature_for(0xAA))
            .unwrap();
        let second = session("0xA11CE", &store)
            .unlock_with_signature(&signature_for(0xAA))
            .unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_channel_rejects_self_and_outsiders() {
        let store = Arc::new(MemoryStore::new());
        let alice = session("0xA11CE", &store);

        assert!(matches!(
            alice.channel(WalletIdentity::parse("0xa11ce").unwrap(), intro_id()),
            Err(Error::InvalidIdentity(_))
        ));

        let intro = IntroParticipants::new(
            WalletIdentity::parse("0xB0B").unwrap(),
            WalletIdentity::parse("0xC4A7").unwrap(),
        );
        assert!(matches!(
            alice.intro_channel(intro_id(), &intro),
            Err(Error::NotAParticipant(_))
        ));
    }

    #[tokio::test]
    async fn test_peer_reads_message() {
        let store = Arc::new(MemoryStore::new());
        let alice = session("0xA11CE", &store);
        let bob = session("0xB0B", &store);
        let intro = IntroParticipants::new(alice.wallet().clone(), bob.wallet().clone());

        bob.unlock(&FixedSigner::new(0xBB)).await.unwrap();
        alice.unlock(&FixedSigner::new(0xAA)).await.unwrap();
        alice
            .intro_channel(intro_id(), &intro)
            .unwrap()
            .send_message("gm")
            .unwrap();

        // Bob reads it
        let bob_view = bob.intro_channel(intro_id(), &intro).unwrap().decrypt_conversation().unwrap();
        assert_eq!(bob_view.len(), 1);
        assert_eq!(bob_view[0].body, MessageBody::Decrypted("gm".into()));
        assert!(!bob_view[0].mine);
    }

    #[tokio::test]
    async fn test_awaiting_key_then_decrypted_after_publish() {
        // One shared conversation log; each side sees its own view of the directory
        let messages = Arc::new(MemoryStore::new());
        let alice_directory = Arc::new(MemoryStore::new());
        let bob_directory = Arc::new(MemoryStore::new());

        let alice = ChatSession::new(
            WalletIdentity::parse("0xA11CE").unwrap(),
            alice_directory.clone(),
            messages.clone(),
        );
        let bob = ChatSession::new(
            WalletIdentity::parse("0xB0B").unwrap(),
            bob_directory.clone(),
            messages.clone(),
        );
        let intro = IntroParticipants::new(alice.wallet().clone(), bob.wallet().clone());

        let bob_key = bob.unlock(&FixedSigner::new(0xBB)).await.unwrap();
        let alice_key = alice.unlock(&FixedSigner::new(0xAA)).await.unwrap();
        alice_directory.put(bob.wallet(), &bob_key).unwrap();

        alice
            .intro_channel(intro_id(), &intro)
            .unwrap()
            .send_message("gm")
            .unwrap();

        // Alice's key has not reached Bob's directory yet
        let channel = bob.intro_channel(intro_id(), &intro).unwrap();
        assert_eq!(channel.state().unwrap(), crate::messaging::ChannelState::PeerKeyMissing);

        let view = channel.decrypt_conversation().unwrap();
        assert_eq!(view[0].body, MessageBody::AwaitingPeerKey);
        assert_ne!(view[0].body, MessageBody::DecryptionFailed);

        // Once it arrives, the next pass decrypts the same stored message
        bob_directory.put(alice.wallet(), &alice_key).unwrap();

        let view = channel.decrypt_conversation().unwrap();
        assert_eq!(view[0].body, MessageBody::Decrypted("gm".into()));
    }

    #[tokio::test]
    async fn test_truncated_ciphertext_fails_alone() {
        use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

        let store = Arc::new(MemoryStore::new());
        let alice = session("0xA11CE", &store);
        let bob = session("0xB0B", &store);
        alice.unlock(&FixedSigner::new(0xAA)).await.unwrap();
        bob.unlock(&FixedSigner::new(0xBB)).await.unwrap();

        let channel = alice.channel(bob.wallet().clone(), intro_id()).unwrap();
        channel.send_message("first").unwrap();
        channel.send_message("second").unwrap();
        channel.send_message("third").unwrap();

        // Re-store the conversation with the second recipient copy one byte short
        let tampered = Arc::new(MemoryStore::new());
        let mut stored = store.list_all(&intro_id()).unwrap();
        let mut ct = BASE64.decode(&stored[1].for_recipient.ct).unwrap();
        ct.pop();
        stored[1].for_recipient.ct = BASE64.encode(ct);
        for message in &stored {
            tampered.append(message).unwrap();
        }
        tampered
            .put(alice.wallet(), &alice.public_key().unwrap())
            .unwrap();

        let bob_elsewhere = session("0xB0B", &tampered);
        bob_elsewhere.unlock_with_signature(&signature_for(0xBB)).unwrap();
        let view = bob_elsewhere
            .channel(alice.wallet().clone(), intro_id())
            .unwrap()
            .decrypt_conversation()
            .unwrap();

        let bodies: Vec<&MessageBody> = view.iter().map(|m| &m.body).collect();
        assert_eq!(
            bodies,
            vec![
                &MessageBody::Decrypted("first".into()),
                &MessageBody::DecryptionFailed,
                &MessageBody::Decrypted("third".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_history_survives_relock() {
        let store = Arc::new(MemoryStore::new());
        let alice = session("0xA11CE", &store);
        let bob = session("0xB0B", &store);
        alice.unlock(&FixedSigner::new(0xAA)).await.unwrap();
        bob.unlock(&FixedSigner::new(0xBB)).await.unwrap();

        alice
            .channel(bob.wallet().clone(), intro_id())
            .unwrap()
            .send_message("gm")
            .unwrap();

        // Lock and come back later with the same wallet signature
        alice.lock();
        alice.unlock(&FixedSigner::new(0xAA)).await.unwrap();

        let view = alice
            .channel(bob.wallet().clone(), intro_id())
            .unwrap()
            .decrypt_conversation()
            .unwrap();
        assert_eq!(view[0].body, MessageBody::Decrypted("gm".into()));
        assert!(view[0].mine);
    }

    #[test]
    fn test_with_config_limits_message_size() {
        let store = Arc::new(MemoryStore::new());
        let config = CoreConfig {
            max_message_size: 4,
            ..CoreConfig::default()
        };
        let alice = ChatSession::with_config(
            WalletIdentity::parse("0xA11CE").unwrap(),
            store.clone(),
            store.clone(),
            config,
        )
        .unwrap();
        let bob = session("0xB0B", &store);
        alice.unlock_with_signature(&signature_for(0xAA)).unwrap();
        bob.unlock_with_signature(&signature_for(0xBB)).unwrap();

        let channel = alice.channel(bob.wallet().clone(), intro_id()).unwrap();
        assert!(channel.send_message("gm").is_ok());
        assert!(matches!(
            channel.send_message("hello"),
            Err(Error::MessageTooLarge { size: 5, max: 4 })
        ));
    }
}

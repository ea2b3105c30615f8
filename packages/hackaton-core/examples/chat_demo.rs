//! # Encrypted Chat Demo
//!
//! This example walks two wallets through an intro conversation:
//! 1. Alice and Bob unlock chat by signing the fixed message
//! 2. Alice sends before Bob's key reaches her directory (blocked)
//! 3. Messages flow once both keys are published
//! 4. Bob reads history on a device that has not seen Alice's key yet
//! 5. A corrupted record shows up as a placeholder, not an error
//!
//! ## Run
//!
//! ```bash
//! RUST_LOG=hackaton_core=debug cargo run --example chat_demo
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha512};
use tracing_subscriber::EnvFilter;

use hackaton_core::{
    ChatSession, ConversationId, ConversationStore, Error, ErrorReport, IntroParticipants,
    MemoryStore, PublicKeyDirectory, Result, WalletIdentity, WalletSigner,
};

/// Stand-in for a browser wallet: deterministic 65-byte "signatures"
struct DemoWallet {
    secret: &'static str,
}

#[async_trait]
impl WalletSigner for DemoWallet {
    async fn sign_message(&self, message: &str) -> Result<String> {
        let mut hasher = Sha512::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(message.as_bytes());
        let mut signature = hasher.finalize().to_vec();
        signature.push(0x1b); // recovery byte
        Ok(format!("0x{}", hex::encode(signature)))
    }
}

struct RejectingWallet;

#[async_trait]
impl WalletSigner for RejectingWallet {
    async fn sign_message(&self, _message: &str) -> Result<String> {
        Err(Error::SigningRejected("User rejected the request.".into()))
    }
}

fn print_conversation(title: &str, session: &ChatSession, intro: &IntroParticipants) -> Result<()> {
    let channel = session.intro_channel(ConversationId::for_intro("intro-42")?, intro)?;
    println!("   {} ({:?}):", title, channel.state()?);
    for message in channel.decrypt_conversation()? {
        let who = if message.mine { "me" } else { "them" };
        println!("     [{:>4}] {}", who, message.body.display_text());
    }
    println!();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hackaton_core=info")),
        )
        .init();

    println!("=================================================");
    println!("          HACKATON ENCRYPTED CHAT DEMO");
    println!("=================================================\n");

    let alice_wallet = WalletIdentity::parse("0xA11CE0000000000000000000000000000000A11C")?;
    let bob_wallet = WalletIdentity::parse("0xB0B0000000000000000000000000000000000B0B")?;
    let intro = IntroParticipants::new(alice_wallet.clone(), bob_wallet.clone());
    let intro_id = ConversationId::for_intro("intro-42")?;

    // One shared message log; each side has its own view of the key directory
    let messages = Arc::new(MemoryStore::new());
    let alice_directory = Arc::new(MemoryStore::new());
    let bob_directory = Arc::new(MemoryStore::new());

    let alice = ChatSession::new(alice_wallet.clone(), alice_directory.clone(), messages.clone());
    let bob = ChatSession::new(bob_wallet.clone(), bob_directory.clone(), messages.clone());

    // =========================================================================
    // STEP 1: Unlock
    // =========================================================================
    println!("1. Unlocking chat...\n");

    match bob.unlock(&RejectingWallet).await {
        Err(e) => {
            let report = ErrorReport::from(e);
            println!("   Bob declined first: code {} - {}", report.code, report.message);
        }
        Ok(_) => println!("   Unexpected: unlock succeeded without a signature"),
    }

    let alice_key = alice.unlock(&DemoWallet { secret: "alice" }).await?;
    let bob_key = bob.unlock(&DemoWallet { secret: "bob" }).await?;
    println!("   Alice key: {} (fingerprint {})", alice_key, alice_key.fingerprint());
    println!("   Bob key:   {} (fingerprint {})", bob_key, bob_key.fingerprint());
    println!();

    // =========================================================================
    // STEP 2: Sending before the peer key is known
    // =========================================================================
    println!("2. Alice tries to send before Bob's key reaches her...\n");

    let channel = alice.intro_channel(intro_id.clone(), &intro)?;
    match channel.send_message("gm") {
        Err(e) => println!("   Blocked: {} (recoverable: {})", e, e.is_recoverable()),
        Ok(_) => println!("   Unexpected: message sent without a peer key"),
    }
    println!();

    // =========================================================================
    // STEP 3: Both keys published
    // =========================================================================
    println!("3. Keys propagate, messages flow...\n");

    alice_directory.put(&bob_wallet, &bob_key)?;
    let sent = channel.send_message("gm! saw your listing, want to team up?")?;
    println!("   Alice sent {} at {}", sent.id, sent.timestamp);

    // Bob's directory still lacks Alice's key
    print_conversation("Bob's view before Alice's key arrives", &bob, &intro)?;

    bob_directory.put(&alice_wallet, &alice_key)?;
    bob.intro_channel(intro_id.clone(), &intro)?
        .send_message("gm! yes, let's build")?;

    print_conversation("Bob's view", &bob, &intro)?;
    print_conversation("Alice's view", &alice, &intro)?;

    // =========================================================================
    // STEP 4: Corruption is isolated
    // =========================================================================
    println!("4. Corrupting one stored record...\n");

    let mut stored = messages.list_all(&intro_id)?;
    stored[0].for_recipient.ct.truncate(8);

    let corrupted = Arc::new(MemoryStore::new());
    for message in &stored {
        corrupted.append(message)?;
    }
    corrupted.put(&alice_wallet, &alice_key)?;

    let bob_elsewhere = ChatSession::new(bob_wallet.clone(), corrupted.clone(), corrupted.clone());
    bob_elsewhere.unlock(&DemoWallet { secret: "bob" }).await?;
    print_conversation("Bob's view of the corrupted log", &bob_elsewhere, &intro)?;

    // =========================================================================
    // STEP 5: Lock
    // =========================================================================
    alice.lock();
    bob.lock();
    println!("5. Sessions locked; keypairs dropped.\n");

    println!("=================================================");
    println!("          DEMO COMPLETE");
    println!("=================================================");

    Ok(())
}

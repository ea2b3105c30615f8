//! # Database Schema
//!
//! SQL schema definitions for the chat database.
//!
//! ## Schema Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         DATABASE SCHEMA                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────┐                  ┌─────────────────┐              │
//! │  │ encryption_keys │                  │  chat_messages  │              │
//! │  ├─────────────────┤                  ├─────────────────┤              │
//! │  │ wallet          │◄─ ─ from/to ─ ─ ─│ seq             │              │
//! │  │ public_key      │                  │ id              │              │
//! │  │ updated_at      │                  │ conversation_id │              │
//! │  └─────────────────┘                  │ from_wallet     │              │
//! │                                       │ to_wallet       │              │
//! │                                       │ recipient_ct    │              │
//! │                                       │ recipient_nonce │              │
//! │                                       │ sender_ct       │              │
//! │                                       │ sender_nonce    │              │
//! │                                       │ timestamp       │              │
//! │                                       └─────────────────┘              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Message bodies are only ever stored sealed. Secret keys are never stored.

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL to create all tables
pub const CREATE_TABLES: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

-- Published chat public keys, one per wallet
CREATE TABLE IF NOT EXISTS encryption_keys (
    -- Lower-cased wallet address
    wallet TEXT PRIMARY KEY,
    -- X25519 public key (standard base64, 44 chars)
    public_key TEXT NOT NULL,
    -- Last publish (Unix timestamp ms)
    updated_at INTEGER NOT NULL
);

-- Dual-encrypted chat messages
CREATE TABLE IF NOT EXISTS chat_messages (
    -- Arrival order
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    -- Message UUID, unique within its conversation
    id TEXT NOT NULL,
    -- Which conversation (intro) this belongs to
    conversation_id TEXT NOT NULL,
    -- Routing metadata, as written by the sender
    from_wallet TEXT NOT NULL,
    to_wallet TEXT NOT NULL,
    -- Copy sealed for the recipient (base64)
    recipient_ct TEXT NOT NULL,
    recipient_nonce TEXT NOT NULL,
    -- Copy sealed for the sender (base64)
    sender_ct TEXT NOT NULL,
    sender_nonce TEXT NOT NULL,
    -- When the message was sent (Unix timestamp ms)
    timestamp INTEGER NOT NULL,
    UNIQUE (conversation_id, id)
);
CREATE INDEX IF NOT EXISTS idx_chat_messages_conversation ON chat_messages(conversation_id, seq);
"#;

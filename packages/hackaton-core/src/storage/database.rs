//! # Database
//!
//! SQLite-backed key directory and conversation store.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      DATABASE OPERATIONS                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │   ChatSession   │                                                   │
//! │  └────────┬────────┘                                                   │
//! │           │  PublicKeyDirectory / ConversationStore                    │
//! │           ▼                                                             │
//! │  ┌─────────────────┐                                                   │
//! │  │    Database     │  - Key publish / lookup                           │
//! │  │   (this file)   │  - Message append / list                          │
//! │  └────────┬────────┘                                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  ┌─────────────────┐                                                   │
//! │  │   SQLite DB     │  - In-memory for tests                            │
//! │  │                 │  - File for the desktop shell                     │
//! │  └─────────────────┘                                                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{params, Connection};

use super::schema;
use super::{ConversationStore, PublicKeyDirectory};
use crate::config::CoreConfig;
use crate::crypto::{EncryptedPayload, PublicKey};
use crate::error::{Error, Result};
use crate::identity::WalletIdentity;
use crate::messaging::{ConversationId, StoredMessage};

/// The main database handle
pub struct Database {
    /// The underlying SQLite connection
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create a database
    ///
    /// If path is None, creates an in-memory database (useful for testing).
    pub fn open(path: Option<&str>) -> Result<Self> {
        let conn = match path {
            Some(p) => Connection::open(p)
                .map_err(|e| Error::DatabaseError(format!("Failed to open database: {}", e)))?,
            None => Connection::open_in_memory().map_err(|e| {
                Error::DatabaseError(format!("Failed to create in-memory database: {}", e))
            })?,
        };

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.init_schema()?;

        Ok(db)
    }

    /// Open the database at the configured storage path
    pub fn from_config(config: &CoreConfig) -> Result<Self> {
        Self::open(config.storage_path.as_deref())
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        let version: Option<i32> = conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .ok();

        match version {
            None => {
                conn.execute_batch(schema::CREATE_TABLES)
                    .map_err(|e| Error::DatabaseError(format!("Failed to create tables: {}", e)))?;

                conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?)",
                    params![schema::SCHEMA_VERSION],
                )
                .map_err(|e| Error::DatabaseError(format!("Failed to set schema version: {}", e)))?;

                tracing::info!("Database schema created (version {})", schema::SCHEMA_VERSION);
            }
            Some(v) if v > schema::SCHEMA_VERSION => {
                return Err(Error::DatabaseError(format!(
                    "Database schema version {} is newer than supported {}",
                    v,
                    schema::SCHEMA_VERSION
                )));
            }
            Some(v) => {
                tracing::debug!("Database schema version: {}", v);
            }
        }

        Ok(())
    }
}

// ============================================================================
// KEY DIRECTORY
// ============================================================================

impl PublicKeyDirectory for Database {
    fn get(&self, wallet: &WalletIdentity) -> Result<Option<PublicKey>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            "SELECT public_key FROM encryption_keys WHERE wallet = ?",
            params![wallet.as_str()],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(encoded) => Ok(Some(PublicKey::from_base64(&encoded)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::StorageReadError(format!(
                "Failed to get key for {}: {}",
                wallet.short(),
                e
            ))),
        }
    }

    fn put(&self, wallet: &WalletIdentity, key: &PublicKey) -> Result<()> {
        let conn = self.conn.lock();
        let now = crate::time::now_timestamp_millis();

        conn.execute(
            "INSERT INTO encryption_keys (wallet, public_key, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(wallet) DO UPDATE SET public_key = excluded.public_key,
                                               updated_at = excluded.updated_at",
            params![wallet.as_str(), key.to_base64(), now],
        )
        .map_err(|e| Error::StorageWriteError(format!("Failed to publish key: {}", e)))?;

        Ok(())
    }
}

// ============================================================================
// CONVERSATION STORE
// ============================================================================

impl ConversationStore for Database {
    fn append(&self, message: &StoredMessage) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            "INSERT OR IGNORE INTO chat_messages (
                id, conversation_id, from_wallet, to_wallet,
                recipient_ct, recipient_nonce, sender_ct, sender_nonce, timestamp
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                message.id,
                message.conversation_id.as_str(),
                message.from_wallet,
                message.to_wallet,
                message.for_recipient.ct,
                message.for_recipient.nonce,
                message.for_sender.ct,
                message.for_sender.nonce,
                message.timestamp,
            ],
        )
        .map_err(|e| Error::StorageWriteError(format!("Failed to store message: {}", e)))?;

        Ok(())
    }

    fn list_all(&self, conversation: &ConversationId) -> Result<Vec<StoredMessage>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, from_wallet, to_wallet,
                        recipient_ct, recipient_nonce, sender_ct, sender_nonce, timestamp
                 FROM chat_messages WHERE conversation_id = ? ORDER BY seq",
            )
            .map_err(|e| Error::StorageReadError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![conversation.as_str()], |row| {
                Ok(StoredMessage {
                    id: row.get(0)?,
                    conversation_id: conversation.clone(),
                    from_wallet: row.get(1)?,
                    to_wallet: row.get(2)?,
                    for_recipient: EncryptedPayload {
                        ct: row.get(3)?,
                        nonce: row.get(4)?,
                    },
                    for_sender: EncryptedPayload {
                        ct: row.get(5)?,
                        nonce: row.get(6)?,
                    },
                    timestamp: row.get(7)?,
                })
            })
            .map_err(|e| Error::StorageReadError(format!("Failed to query messages: {}", e)))?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(
                row.map_err(|e| Error::StorageReadError(format!("Failed to read message: {}", e)))?,
            );
        }

        Ok(messages)
    }
}

// ============================================================================
// TESTS
// ============================================================================

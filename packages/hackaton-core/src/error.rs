//! # Error Handling
//!
//! Error types for the HackaTon chat core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Session Errors                                                    │
//! │  │   └── Locked                - Chat not unlocked in this session     │
//! │  │                                                                      │
//! │  ├── Key Derivation Errors                                             │
//! │  │   ├── SigningRejected       - Wallet declined / failed to sign      │
//! │  │   ├── InvalidSignatureFormat- Signature is not decodable hex        │
//! │  │   └── KeyDerivationFailed   - HKDF expansion failed                 │
//! │  │                                                                      │
//! │  ├── Crypto Errors                                                     │
//! │  │   ├── EncryptionFailed      - AEAD seal failed                      │
//! │  │   └── InvalidEncoding       - Bad base64 / wrong key/nonce length   │
//! │  │                                                                      │
//! │  ├── Storage Errors                                                    │
//! │  │   ├── StorageReadError      - Collaborator read failed              │
//! │  │   ├── StorageWriteError     - Collaborator write failed             │
//! │  │   └── DatabaseError         - SQLite error                          │
//! │  │                                                                      │
//! │  ├── Identity Errors                                                   │
//! │  │   ├── InvalidIdentity       - Empty / malformed wallet identity     │
//! │  │   └── NotAParticipant       - Wallet is not part of the intro       │
//! │  │                                                                      │
//! │  ├── Message Errors                                                    │
//! │  │   ├── PeerKeyUnavailable    - Peer has not published a key yet      │
//! │  │   ├── InvalidMessageContent - Empty draft                           │
//! │  │   └── MessageTooLarge       - Draft exceeds the configured limit    │
//! │  │                                                                      │
//! │  └── Configuration Errors                                              │
//! │      └── InvalidConfig         - Unusable CoreConfig value             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Per-message decryption failures are deliberately *not* errors. They show
//! up as [`crate::messaging::MessageBody::DecryptionFailed`] so that one bad
//! record never aborts a conversation pass.
//!
//! No variant ever carries key material, signatures or plaintext.

use serde::Serialize;
use thiserror::Error;

/// Result type alias for chat core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the chat core
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Session Errors (100-199)
    // ========================================================================

    /// No keypair has been derived in this session
    #[error("Chat is locked. Sign the unlock message with your wallet first.")]
    Locked,

    // ========================================================================
    // Key Derivation Errors (200-299)
    // ========================================================================

    /// The wallet user declined to sign, or the wallet errored
    #[error("Wallet signing was rejected: {0}")]
    SigningRejected(String),

    /// The wallet returned something that is not a hex byte string
    #[error("Invalid signature format: {0}")]
    InvalidSignatureFormat(String),

    /// Key derivation failed
    #[error("Failed to derive keys: {0}")]
    KeyDerivationFailed(String),

    // ========================================================================
    // Crypto Errors (300-399)
    // ========================================================================

    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Malformed base64, or a key / nonce / ciphertext of the wrong length
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    // ========================================================================
    // Storage Errors (400-499)
    // ========================================================================

    /// Failed to read from storage
    #[error("Failed to read from storage: {0}")]
    StorageReadError(String),

    /// Failed to write to storage
    #[error("Failed to write to storage: {0}")]
    StorageWriteError(String),

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(String),

    // ========================================================================
    // Identity Errors (500-599)
    // ========================================================================

    /// Wallet identity is empty or malformed
    #[error("Invalid wallet identity: {0}")]
    InvalidIdentity(String),

    /// Wallet is neither side of the conversation
    #[error("{0} is not a participant in this conversation")]
    NotAParticipant(String),

    // ========================================================================
    // Message Errors (700-799)
    // ========================================================================

    /// Counterparty has not published an encryption key yet
    #[error("{0} hasn't unlocked chat yet; their encryption key isn't available.")]
    PeerKeyUnavailable(String),

    /// Invalid message content
    #[error("Invalid message content: {0}")]
    InvalidMessageContent(String),

    /// Message is larger than the configured maximum
    #[error("Message too large: {size} bytes (max {max})")]
    MessageTooLarge {
        /// Size of the rejected draft in bytes
        size: usize,
        /// Configured maximum
        max: usize,
    },

    // ========================================================================
    // Configuration Errors (800-899)
    // ========================================================================

    /// A configuration value is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl Error {
    /// Get the numeric error code for the UI / FFI boundary
    ///
    /// - 100-199: Session
    /// - 200-299: Key derivation
    /// - 300-399: Crypto
    /// - 400-499: Storage
    /// - 500-599: Identity
    /// - 700-799: Messages
    /// - 800-899: Configuration
    /// - 900-999: Internal
    pub fn code(&self) -> i32 {
        match self {
            Error::Locked => 100,

            Error::SigningRejected(_) => 200,
            Error::InvalidSignatureFormat(_) => 201,
            Error::KeyDerivationFailed(_) => 202,

            Error::EncryptionFailed(_) => 300,
            Error::InvalidEncoding(_) => 301,

            Error::StorageReadError(_) => 400,
            Error::StorageWriteError(_) => 401,
            Error::DatabaseError(_) => 402,

            Error::InvalidIdentity(_) => 500,
            Error::NotAParticipant(_) => 501,

            Error::PeerKeyUnavailable(_) => 700,
            Error::InvalidMessageContent(_) => 701,
            Error::MessageTooLarge { .. } => 702,

            Error::InvalidConfig(_) => 800,

            Error::SerializationError(_) => 900,
        }
    }

    /// Check if this error is a transient condition
    ///
    /// A missing peer key resolves itself once the peer unlocks chat;
    /// callers should poll / re-render rather than retry immediately.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::PeerKeyUnavailable(_))
    }

    /// Check if this error requires user action
    pub fn requires_user_action(&self) -> bool {
        matches!(
            self,
            Error::Locked
                | Error::SigningRejected(_)
                | Error::InvalidMessageContent(_)
                | Error::MessageTooLarge { .. }
        )
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::InvalidEncoding(format!("invalid base64: {}", err))
    }
}

impl From<hex::FromHexError> for Error {
    fn from(err: hex::FromHexError) -> Self {
        Error::InvalidSignatureFormat(err.to_string())
    }
}

// ============================================================================
// UI ERROR REPRESENTATION
// ============================================================================

/// Serializable error representation for the UI layer
///
/// Lets the app shell tell "waiting for peer" apart from hard failures
/// without matching on Rust types.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    /// Numeric error code
    pub code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the condition is transient
    pub recoverable: bool,
}

impl From<Error> for ErrorReport {
    fn from(err: Error) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

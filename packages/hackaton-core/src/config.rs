//! Configuration for a chat session.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::messaging::MAX_MESSAGE_SIZE;

/// Configuration for the chat core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreConfig {
    /// Largest draft accepted by `send_message`, in bytes, after trimming
    pub max_message_size: usize,
    /// SQLite database path (in-memory if None)
    pub storage_path: Option<String>,
    /// Log per-conversation decrypt summaries at `info` instead of `debug`
    pub verbose_logging: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            max_message_size: MAX_MESSAGE_SIZE,
            storage_path: None,
            verbose_logging: false,
        }
    }
}

impl CoreConfig {
    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.max_message_size == 0 {
            return Err(Error::InvalidConfig(
                "max_message_size must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoreConfig::default();
        assert_eq!(config.max_message_size, 64 * 1024);
        assert!(config.storage_path.is_none());
        assert!(!config.verbose_logging);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: CoreConfig = serde_json::from_str(r#"{"storagePath":"chat.db"}"#).unwrap();
        assert_eq!(config.storage_path.as_deref(), Some("chat.db"));
        assert_eq!(config.max_message_size, MAX_MESSAGE_SIZE);
    }

    #[test]
    fn test_zero_limit_rejected() {
        let config = CoreConfig {
            max_message_size: 0,
            ..CoreConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert_eq!(err.code(), 800);
    }
}

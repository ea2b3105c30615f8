//! Wallet identities.
//!
//! A participant is identified by their wallet address. Addresses are hex
//! and show up with inconsistent casing (checksummed vs lower-case), so
//! every comparison goes through [`WalletIdentity`], which stores the
//! trimmed, lower-cased form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A normalized wallet address
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletIdentity(String);

impl WalletIdentity {
    /// Parse and normalize a wallet identity
    ///
    /// Leading/trailing whitespace is dropped and the address lower-cased.
    /// Empty input or embedded whitespace is rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidIdentity("identity is empty".into()));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(Error::InvalidIdentity(format!(
                "identity contains whitespace: {:?}",
                trimmed
            )));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// The normalized address
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a raw address from a record
    pub fn matches(&self, raw: &str) -> bool {
        raw.trim().eq_ignore_ascii_case(&self.0)
    }

    /// Abbreviated form for logs and UI labels (`0x1234…abcd`)
    pub fn short(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 12 {
            return self.0.clone();
        }
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}…{}", head, tail)
    }
}

impl fmt::Display for WalletIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for WalletIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WalletIdentity({})", self.0)
    }
}

impl FromStr for WalletIdentity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for WalletIdentity {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<WalletIdentity> for String {
    fn from(identity: WalletIdentity) -> Self {
        identity.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKSUMMED: &str = "0xAbCdEf0123456789aBcDeF0123456789AbCdEf01";

    #[test]
    fn test_parse_normalizes_case() {
        let id = WalletIdentity::parse(CHECKSUMMED).unwrap();
        assert_eq!(id.as_str(), "0xabcdef0123456789abcdef0123456789abcdef01");
        assert_eq!(id, WalletIdentity::parse(&CHECKSUMMED.to_uppercase()).unwrap());
    }

    #[test]
    fn test_parse_trims() {
        let id: WalletIdentity = "  0xB0B  ".parse().unwrap();
        assert_eq!(id.as_str(), "0xb0b");
    }

    #[test]
    fn test_parse_rejects_empty_and_whitespace() {
        assert!(matches!(WalletIdentity::parse("   "), Err(Error::InvalidIdentity(_))));
        assert!(matches!(WalletIdentity::parse("0xab cd"), Err(Error::InvalidIdentity(_))));
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let id = WalletIdentity::parse(CHECKSUMMED).unwrap();
        assert!(id.matches(&CHECKSUMMED.to_lowercase()));
        assert!(id.matches(CHECKSUMMED));
        assert!(!id.matches("0xdeadbeef"));
    }

    #[test]
    fn test_short() {
        let id = WalletIdentity::parse(CHECKSUMMED).unwrap();
        assert_eq!(id.short(), "0xabcd…ef01");
        assert_eq!(WalletIdentity::parse("0xb0b").unwrap().short(), "0xb0b");
        assert_eq!(WalletIdentity::parse("ñññññññññññññ").unwrap().short(), "ññññññ…ññññ");
    }

    #[test]
    fn test_serde_normalizes() {
        let id: WalletIdentity = serde_json::from_str(&format!("\"{}\"", CHECKSUMMED)).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), format!("\"{}\"", id.as_str()));
        assert!(serde_json::from_str::<WalletIdentity>("\"\"").is_err());
    }
}

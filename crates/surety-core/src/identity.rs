use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("identity must not be empty")]
pub struct InvalidIdentity;

/// Caller identity on the ledger: an airline, a passenger, an oracle operator,
/// the owner or an entry-point service.
///
/// Identities compare case-insensitively; they are stored trimmed and lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, InvalidIdentity> {
        let normalized = raw.as_ref().trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(InvalidIdentity);
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Identity {
    type Error = InvalidIdentity;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Identity> for String {
    fn from(value: Identity) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        let a = Identity::parse("  0xAbC ").unwrap();
        let b = Identity::parse("0xabc").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "0xabc");
    }

    #[test]
    fn rejects_blank() {
        assert_eq!(Identity::parse("   "), Err(InvalidIdentity));
        assert!(serde_json::from_str::<Identity>("\"\"").is_err());
        assert_eq!(Identity::try_from("\t\n".to_string()), Err(InvalidIdentity));
    }
}

//! Voter account address type with `0x` prefix.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A voter's ledger account address, always prefixed with `0x`.
///
/// The ledger identifies accounts by 20-byte addresses rendered as
/// `0x`-prefixed hex.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoterAddress(String);

impl VoterAddress {
    /// The standard prefix for all voter addresses.
    pub const PREFIX: &'static str = "0x";

    /// Create a new voter address from a raw string.
    ///
    /// # Panics
    /// Panics if the string does not start with `0x`.
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into();
        assert!(s.starts_with(Self::PREFIX), "address must start with 0x");
        Self(s)
    }

    /// Parse a raw string into an address, `None` if the prefix is missing.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.starts_with(Self::PREFIX) {
            Some(Self(raw.to_string()))
        } else {
            None
        }
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this address is well-formed: `0x` followed by exactly
    /// 40 hex digits.
    pub fn is_valid(&self) -> bool {
        match self.0.strip_prefix(Self::PREFIX) {
            Some(hex) => hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()),
            None => false,
        }
    }
}

impl fmt::Display for VoterAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VoterAddress {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

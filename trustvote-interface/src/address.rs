use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Length of an account address, in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Errors produced when parsing an [`AccountAddress`] from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    /// The input was empty after trimming.
    #[error("address is empty")]
    Empty,
    /// The input does not start with the `0x` prefix.
    #[error("address must start with 0x")]
    MissingPrefix,
    /// The input does not have exactly 40 hex digits after the prefix.
    #[error("address must have {expected} hex characters after 0x, got {got}")]
    InvalidLength {
        /// Expected number of hex characters.
        expected: usize,
        /// Number of characters found.
        got: usize,
    },
    /// The input contains a character outside `[0-9a-fA-F]`.
    #[error("address contains a non-hex character")]
    InvalidHex,
}

/// A 20-byte account address of the EVM chain the voting contract lives on.
///
/// The textual form is `0x` followed by exactly 40 hex characters. Upper and
/// lower case digits are both accepted; the canonical form is lower case.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountAddress([u8; ADDRESS_LEN]);

impl AccountAddress {
    /// Wraps raw address bytes.
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// The raw address bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

impl From<[u8; ADDRESS_LEN]> for AccountAddress {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}

impl FromStr for AccountAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(AddressParseError::Empty);
        }
        let digits = s
            .strip_prefix("0x")
            .ok_or(AddressParseError::MissingPrefix)?;
        if digits.len() != ADDRESS_LEN * 2 {
            return Err(AddressParseError::InvalidLength {
                expected: ADDRESS_LEN * 2,
                got: digits.len(),
            });
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AddressParseError::InvalidHex);
        }

        let mut bytes = [0u8; ADDRESS_LEN];
        hex::decode_to_slice(digits, &mut bytes).map_err(|_| AddressParseError::InvalidHex)?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for AccountAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AccountAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

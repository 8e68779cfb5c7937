use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::TypeError;

/// Byte length of every [`Identifier`].
pub const IDENTIFIER_LEN: usize = 32;

/// Fixed-length content address naming a ledger record.
///
/// The same type names both puzzle hashes (the address a record is locked
/// to) and coin names (a record's own identity). Two identifiers are equal
/// iff their bytes are equal. Externally they travel as hex strings with an
/// optional `0x` marker.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier([u8; IDENTIFIER_LEN]);

impl Identifier {
    /// Create an identifier from a pre-computed 32-byte hash.
    pub const fn from_hash(hash: [u8; IDENTIFIER_LEN]) -> Self {
        Self(hash)
    }

    /// SHA-256 of `data`.
    pub fn sha256(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// The all-zero identifier.
    pub const fn null() -> Self {
        Self([0u8; IDENTIFIER_LEN])
    }

    /// Returns `true` if every byte is zero.
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; IDENTIFIER_LEN]
    }

    /// The raw 32 bytes.
    pub fn as_bytes(&self) -> &[u8; IDENTIFIER_LEN] {
        &self.0
    }

    /// Lowercase hex without a prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Lowercase hex with a `0x` prefix, the form the full-node RPC speaks.
    pub fn to_prefixed_hex(&self) -> String {
        format!("0x{}", self.to_hex())
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string, with or without a leading `0x`/`0X`.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hexstr_to_bytes(s)?;
        Self::try_from(bytes.as_slice())
    }
}

/// Decode a hex string into bytes, stripping a leading `0x`/`0X` if present.
pub fn hexstr_to_bytes(s: &str) -> Result<Vec<u8>, TypeError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    hex::decode(digits).map_err(|e| TypeError::InvalidHex(e.to_string()))
}

impl TryFrom<&[u8]> for Identifier {
    type Error = TypeError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; IDENTIFIER_LEN] =
            bytes.try_into().map_err(|_| TypeError::InvalidLength {
                expected: IDENTIFIER_LEN,
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }
}

impl FromStr for Identifier {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self.short_hex())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; IDENTIFIER_LEN]> for Identifier {
    fn from(bytes: [u8; IDENTIFIER_LEN]) -> Self {
        Self(bytes)
    }
}

impl From<Identifier> for [u8; IDENTIFIER_LEN] {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

impl AsRef<[u8]> for Identifier {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_prefixed_hex())
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

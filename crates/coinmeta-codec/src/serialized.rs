use std::fmt;

use coinmeta_types::hexstr_to_bytes;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CodecResult;
use crate::program::Program;

/// Serialized program bytes as carried by a spend.
///
/// Travels over JSON as a `0x`-prefixed hex string. The bytes are only parsed
/// on demand via [`SerializedProgram::to_program`].
#[derive(Clone, PartialEq, Eq, Default)]
pub struct SerializedProgram(Vec<u8>);

impl SerializedProgram {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn from_program(program: &Program) -> CodecResult<Self> {
        Ok(Self(program.serialize()?))
    }

    pub fn from_hex(s: &str) -> CodecResult<Self> {
        Ok(Self(hexstr_to_bytes(s)?))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }

    pub fn to_program(&self) -> CodecResult<Program> {
        Program::deserialize(&self.0)
    }
}

impl fmt::Debug for SerializedProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SerializedProgram({} bytes)", self.0.len())
    }
}

impl Serialize for SerializedProgram {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SerializedProgram {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_is_prefixed_hex() {
        let sp = SerializedProgram::from_bytes(vec![0xFF, 0x80, 0x80]);
        let json = serde_json::to_string(&sp).unwrap();
        assert_eq!(json, "\"0xff8080\"");
        let back: SerializedProgram = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sp);
    }

    #[test]
    fn unprefixed_hex_accepted() {
        let sp = SerializedProgram::from_hex("80").unwrap();
        assert!(sp.to_program().unwrap().is_nil());
    }

    #[test]
    fn bad_hex_rejected() {
        assert!(serde_json::from_str::<SerializedProgram>("\"0xzz\"").is_err());
    }
}

//! Strong type definitions for the audit trail signer.
//!
//! All identifiers are newtypes to prevent misuse at compile time.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A 256-bit value: a SHA-256 digest, an input/output/transaction identifier,
/// or a Merkle node.
///
/// Stored big-endian, so the derived `Ord` is numeric order. Identifiers
/// travel as 64-character lowercase hex; Merkle hashing uses the minimal
/// integer form from [`Hash256::to_int_hex`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Fixed-width hex (64 chars).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Hex of the value read as an unsigned integer: no leading zeros,
    /// `"0"` for zero.
    pub fn to_int_hex(&self) -> String {
        let full = self.to_hex();
        let trimmed = full.trim_start_matches('0');
        if trimmed.is_empty() {
            "0".to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// Parse a hex integer of at most 64 digits, left-padding short input.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        if s.is_empty() || s.len() > 64 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut padded = String::with_capacity(64);
        for _ in 0..(64 - s.len()) {
            padded.push('0');
        }
        padded.push_str(s);
        let mut arr = [0u8; 32];
        hex::decode_to_slice(&padded, &mut arr)?;
        Ok(Self(arr))
    }

    /// The zero value.
    pub const ZERO: Self = Self([0u8; 32]);
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Hash256 {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; 32] = slice.try_into()?;
        Ok(Self(arr))
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash256::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// The spendable output currently tracked by this installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnspentOutput {
    /// Identifier of the output being tracked.
    pub output_id: Hash256,
    /// Amount held by the output.
    pub value: i64,
}

impl UnspentOutput {
    pub fn new(output_id: Hash256, value: i64) -> Self {
        Self { output_id, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_hex_roundtrip() {
        let id = Hash256::from_bytes([0x42; 32]);
        let recovered = Hash256::from_hex(&id.to_hex()).unwrap();
        assert_eq!(id, recovered);
    }

    #[test]
    fn test_int_hex_strips_leading_zeros() {
        let mut bytes = [0u8; 32];
        bytes[30] = 0x0a;
        bytes[31] = 0xbc;
        let h = Hash256::from_bytes(bytes);
        assert_eq!(h.to_int_hex(), "abc");
        assert_eq!(Hash256::ZERO.to_int_hex(), "0");
    }

    #[test]
    fn test_from_hex_pads_short_input() {
        let h = Hash256::from_hex("abc").unwrap();
        assert_eq!(h.as_bytes()[30], 0x0a);
        assert_eq!(h.as_bytes()[31], 0xbc);
        assert!(h.as_bytes()[..30].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(Hash256::from_hex("").is_err());
        assert!(Hash256::from_hex(&"f".repeat(65)).is_err());
        assert!(Hash256::from_hex("zz").is_err());
    }

    #[test]
    fn test_ordering_is_numeric() {
        let small = Hash256::from_hex("ff").unwrap();
        let large = Hash256::from_hex("100").unwrap();
        assert!(small < large);
    }

    #[test]
    fn test_unspent_output_json_shape() {
        let utxo = UnspentOutput::new(Hash256::from_bytes([0x01; 32]), 5);
        let json = serde_json::to_string(&utxo).unwrap();
        assert_eq!(
            json,
            format!("{{\"outputId\":\"{}\",\"value\":5}}", "01".repeat(32))
        );
        let back: UnspentOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(back, utxo);
    }
}

use crate::error::TypesError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// An opaque byte payload.
///
/// Cheap to clone (reference counted) and rendered as a base64 string in
/// JSON, which is how messages, data fields, raw storage keys and contract
/// code travel through the simulator.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Binary(Bytes);

impl Binary {
    pub fn new(data: Vec<u8>) -> Self {
        Self(Bytes::from(data))
    }

    pub fn from_base64(encoded: &str) -> Result<Self, TypesError> {
        let data = STANDARD
            .decode(encoded)
            .map_err(|e| TypesError::InvalidBase64(e.to_string()))?;
        Ok(Self::new(data))
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Binary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Binary(0x{})", hex::encode(&self.0))
    }
}

impl fmt::Display for Binary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl From<Vec<u8>> for Binary {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&[u8]> for Binary {
    fn from(data: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(data))
    }
}

impl From<Bytes> for Binary {
    fn from(data: Bytes) -> Self {
        Self(data)
    }
}

impl AsRef<[u8]> for Binary {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Binary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Binary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Binary::from_base64(&encoded).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_roundtrip() {
        let bin = Binary::new(vec![0, 1, 2, 255]);
        let encoded = bin.to_base64();
        let decoded = Binary::from_base64(&encoded).unwrap();
        assert_eq!(bin, decoded);
    }

    #[test]
    fn test_serde_as_base64_string() {
        let bin = Binary::new(b"d".to_vec());
        let json = serde_json::to_string(&bin).unwrap();
        assert_eq!(json, "\"ZA==\"");

        let back: Binary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bin);
    }

    #[test]
    fn test_invalid_base64() {
        assert!(Binary::from_base64("!!not base64!!").is_err());
    }

    #[test]
    fn test_empty() {
        let bin = Binary::default();
        assert!(bin.is_empty());
        assert_eq!(bin.to_base64(), "");
    }
}
